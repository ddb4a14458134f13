//! Seam between the coordinator and the upstream client.
//!
//! The coordinator only needs a handful of upstream operations;
//! [`ParkingApi`] names them so tests can script responses without a
//! network. [`twopark_net::ApiClient`] is the production implementation.

use std::future::Future;

use chrono::NaiveDateTime;
use twopark_core::{Balance, Member, Money, Product};
use twopark_net as net;

pub trait ParkingApi: Send + Sync {
    /// All products of the account, flattened across categories.
    fn list_products(&self) -> impl Future<Output = net::Result<Vec<Product>>> + Send;

    /// Refreshed product metadata plus its member roster.
    fn product_detail(
        &self,
        product_id: &str,
    ) -> impl Future<Output = net::Result<(Product, Vec<Member>)>> + Send;

    fn balance(&self, product_id: &str) -> impl Future<Output = net::Result<Balance>> + Send;

    /// Starts a session and returns the upstream's estimated cost.
    fn start_action(
        &self,
        product_id: &str,
        plate: &str,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        location: &str,
    ) -> impl Future<Output = net::Result<Money>> + Send;

    fn stop_action(
        &self,
        product_id: &str,
        action_id: &str,
    ) -> impl Future<Output = net::Result<()>> + Send;

    fn set_favorite(
        &self,
        product_id: &str,
        plate: &str,
        nickname: &str,
        add: bool,
    ) -> impl Future<Output = net::Result<()>> + Send;
}

impl ParkingApi for net::ApiClient {
    fn list_products(&self) -> impl Future<Output = net::Result<Vec<Product>>> + Send {
        net::ApiClient::list_products(self)
    }

    fn product_detail(
        &self,
        product_id: &str,
    ) -> impl Future<Output = net::Result<(Product, Vec<Member>)>> + Send {
        net::ApiClient::product_detail(self, product_id)
    }

    fn balance(&self, product_id: &str) -> impl Future<Output = net::Result<Balance>> + Send {
        net::ApiClient::balance(self, product_id)
    }

    fn start_action(
        &self,
        product_id: &str,
        plate: &str,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        location: &str,
    ) -> impl Future<Output = net::Result<Money>> + Send {
        net::ApiClient::start_action(self, product_id, plate, start, end, location)
    }

    fn stop_action(
        &self,
        product_id: &str,
        action_id: &str,
    ) -> impl Future<Output = net::Result<()>> + Send {
        net::ApiClient::stop_action(self, product_id, action_id)
    }

    fn set_favorite(
        &self,
        product_id: &str,
        plate: &str,
        nickname: &str,
        add: bool,
    ) -> impl Future<Output = net::Result<()>> + Send {
        net::ApiClient::set_favorite(self, product_id, plate, nickname, add)
    }
}
