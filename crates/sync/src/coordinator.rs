//! Polling and reconciliation for one 2Park account.
//!
//! The coordinator owns the published [`Snapshot`]. Refresh cycles are
//! serialized on a single gate so a periodic poll and a forced
//! post-mutation refresh never interleave; readers take the current
//! snapshot without blocking on either.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use twopark_core::{Money, ProductState, Snapshot};
use twopark_net as net;

use crate::api::ParkingApi;
use crate::config::Config;
use crate::error::{Error, Result};

/// Consecutive failed refresh cycles before the coordinator degrades.
const DEGRADE_AFTER_FAILURES: u32 = 3;

/// Pause between per-product fetches within one cycle. The upstream is a
/// small municipal service; we do not hammer it.
const INTER_PRODUCT_DELAY: Duration = Duration::from_millis(200);

/// Poll interval multiplier while degraded.
const DEGRADED_BACKOFF_FACTOR: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No refresh has run yet; the snapshot is empty.
    Uninitialized,
    /// First cycle is establishing a session.
    Authenticating,
    Refreshing,
    Ready,
    /// Too many consecutive failures; polling continues at a backed-off
    /// cadence until a cycle succeeds.
    Degraded,
}

/// What one refresh cycle produced alongside the snapshot.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Products whose fetch failed this cycle and kept their previous data.
    pub stale_products: Vec<String>,
}

pub struct Coordinator<A: ParkingApi> {
    api: A,
    config: Config,
    snapshot: RwLock<Arc<Snapshot>>,
    state: StdMutex<SyncState>,
    /// Serializes refresh cycles. A forced refresh waits here for an
    /// in-flight periodic one, then runs immediately after it.
    refresh_gate: Mutex<()>,
    /// At most one mutation flow per account.
    mutation_gate: Mutex<()>,
    consecutive_failures: AtomicU32,
}

impl Coordinator<net::ApiClient> {
    /// Builds a coordinator backed by the real upstream client.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let credentials = config.credentials();
        let client = match &config.base_url {
            Some(base_url) => net::ApiClient::with_base_url(credentials, base_url)?,
            None => net::ApiClient::new(credentials)?,
        };
        Self::new(config, client)
    }
}

impl<A: ParkingApi> Coordinator<A> {
    pub fn new(config: Config, api: A) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            api,
            config,
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            state: StdMutex::new(SyncState::Uninitialized),
            refresh_gate: Mutex::new(()),
            mutation_gate: Mutex::new(()),
            consecutive_failures: AtomicU32::new(0),
        })
    }

    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The most recently published snapshot. Never blocks on a refresh.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_state(&self, next: SyncState) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state != next {
            debug!(from = ?*state, to = ?next, "state transition");
            *state = next;
        }
    }

    /// Runs a refresh cycle and returns the published snapshot.
    ///
    /// With `force = false` a snapshot younger than the poll interval is
    /// returned as-is; `force = true` always goes upstream. Per-product
    /// failures leave that product's previous data in place; only a failure
    /// to list products, or an authentication failure, fails the cycle.
    pub async fn refresh(&self, force: bool) -> Result<Arc<Snapshot>> {
        let _gate = self.refresh_gate.lock().await;

        if !force && self.state() == SyncState::Ready {
            let current = self.current_snapshot();
            if let Ok(age) = current.age().to_std() {
                if age < self.config.poll_interval() {
                    return Ok(current);
                }
            }
        }

        match self.run_cycle().await {
            Ok((snapshot, report)) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                self.set_state(SyncState::Ready);
                if report.stale_products.is_empty() {
                    debug!(products = snapshot.products.len(), "refresh complete");
                } else {
                    warn!(
                        stale = ?report.stale_products,
                        "refresh complete with stale products"
                    );
                }
                Ok(snapshot)
            }
            Err(err) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures >= DEGRADE_AFTER_FAILURES {
                    self.set_state(SyncState::Degraded);
                    warn!(failures, error = %err, "refresh failed, coordinator degraded");
                } else {
                    warn!(failures, error = %err, "refresh failed");
                }
                Err(err)
            }
        }
    }

    async fn run_cycle(&self) -> Result<(Arc<Snapshot>, RefreshReport)> {
        {
            let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            *state = if *state == SyncState::Uninitialized {
                SyncState::Authenticating
            } else {
                SyncState::Refreshing
            };
        }

        let products = self.api.list_products().await.map_err(Error::Api)?;
        self.set_state(SyncState::Refreshing);

        let previous = self.current_snapshot();
        let mut next = Snapshot::empty();
        let mut report = RefreshReport::default();

        for (index, product) in products.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(INTER_PRODUCT_DELAY).await;
            }
            let product_id = product.id.clone();
            match self.fetch_product_state(product).await {
                Ok(state) => {
                    next.products.insert(product_id, state);
                }
                Err(err) if err.is_auth() => return Err(Error::Api(err)),
                Err(err) => {
                    warn!(
                        product = %product_id,
                        error = %err,
                        "product fetch failed, keeping previous data"
                    );
                    if let Some(prev) = previous.get(&product_id) {
                        next.products.insert(product_id.clone(), prev.clone());
                    }
                    report.stale_products.push(product_id);
                }
            }
        }

        next.taken_at = Utc::now();
        let snapshot = Arc::new(next);
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot.clone();
        Ok((snapshot, report))
    }

    async fn fetch_product_state(&self, listed: twopark_core::Product) -> net::Result<ProductState> {
        let (mut product, members) = self.api.product_detail(&listed.id).await?;
        if product.location.is_none() {
            product.location = listed.location;
        }
        let balance = self.api.balance(&listed.id).await?;
        Ok(ProductState {
            product,
            members,
            balance,
        })
    }

    /// Starts a parking session for `plate` and returns the estimated cost.
    ///
    /// Optionally saves the plate as a favorite under `favorite_name`; a
    /// favorite failure is logged and does not undo the started session.
    /// Finishes with a forced refresh so the snapshot shows the new session.
    pub async fn start_parking(
        &self,
        product_id: &str,
        plate: &str,
        end: Option<NaiveDateTime>,
        favorite_name: Option<&str>,
    ) -> Result<Money> {
        let _gate = self
            .mutation_gate
            .try_lock()
            .map_err(|_| Error::MutationInFlight)?;

        let location = self.location_for(product_id)?;
        let start = Local::now().naive_local();
        let cost = self
            .api
            .start_action(product_id, plate, start, end, &location)
            .await
            .map_err(Error::Api)?;
        info!(product = product_id, plate, cost = %cost, "parking session started");

        if let Some(nickname) = favorite_name {
            if let Err(err) = self.api.set_favorite(product_id, plate, nickname, true).await {
                warn!(plate, error = %err, "saving favorite failed, session unaffected");
            }
        }

        self.refresh_after_mutation().await?;
        Ok(cost)
    }

    /// Stops the active session for `plate`. The action id is resolved from
    /// the current snapshot; an unknown or inactive plate fails locally
    /// without an upstream call.
    pub async fn stop_parking(&self, product_id: &str, plate: &str) -> Result<()> {
        let _gate = self
            .mutation_gate
            .try_lock()
            .map_err(|_| Error::MutationInFlight)?;

        let action_id = self
            .current_snapshot()
            .get(product_id)
            .and_then(|state| state.member_by_plate(plate))
            .and_then(|member| member.active_action())
            .and_then(|action| action.id.clone())
            .ok_or_else(|| {
                Error::Api(net::Error::domain(
                    "ATN_NOT_ACTIVE",
                    format!("no active parking session for plate {plate}"),
                ))
            })?;

        self.api
            .stop_action(product_id, &action_id)
            .await
            .map_err(Error::Api)?;
        info!(product = product_id, plate, action = %action_id, "parking session stopped");

        self.refresh_after_mutation().await
    }

    /// Adds or removes a favorite plate, then refreshes the snapshot.
    pub async fn set_favorite(
        &self,
        product_id: &str,
        plate: &str,
        nickname: &str,
        add: bool,
    ) -> Result<()> {
        let _gate = self
            .mutation_gate
            .try_lock()
            .map_err(|_| Error::MutationInFlight)?;

        self.api
            .set_favorite(product_id, plate, nickname, add)
            .await
            .map_err(Error::Api)?;
        info!(product = product_id, plate, add, "favorite updated");

        self.refresh_after_mutation().await
    }

    /// Polls forever on the configured cadence, backing off while degraded.
    /// Failures here surface only as snapshot staleness and log output.
    pub async fn run(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.poll_delay()).await;
            if let Err(err) = self.refresh(true).await {
                if err.is_auth() {
                    error!(error = %err, "authentication failed, check credentials");
                }
            }
        }
    }

    fn poll_delay(&self) -> Duration {
        let base = self.config.poll_interval();
        if self.state() == SyncState::Degraded {
            base * DEGRADED_BACKOFF_FACTOR
        } else {
            base
        }
    }

    /// The mutation succeeded; only an auth failure during the follow-up
    /// refresh is worth failing the whole flow for.
    async fn refresh_after_mutation(&self) -> Result<()> {
        match self.refresh(true).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_auth() => Err(err),
            Err(err) => {
                warn!(error = %err, "post-mutation refresh failed, snapshot is stale");
                Ok(())
            }
        }
    }

    fn location_for(&self, product_id: &str) -> Result<String> {
        self.current_snapshot()
            .get(product_id)
            .and_then(|state| state.product.location_code())
            .or_else(|| twopark_core::models::derive_location(product_id))
            .ok_or_else(|| {
                Error::Api(net::Error::domain(
                    "LOCATION_UNKNOWN",
                    format!("no location code known for product {product_id}"),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::future::Future;
    use std::sync::atomic::AtomicBool;

    use twopark_core::{
        Action, ActionState, Balance, Member, MemberKind, Product, ProductCapabilities,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    fn transport_error() -> net::Error {
        net::Error::Json(serde_json::from_str::<serde_json::Value>("garbage").unwrap_err())
    }

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Bezoekersregeling {id}"),
            valid_from: None,
            valid_to: None,
            blocked: false,
            capabilities: ProductCapabilities::parse("MM"),
            max_members: Some(5),
            max_active_members: Some(2),
            location: Some("BDA1317".to_string()),
        }
    }

    fn balance(cents: i64) -> Balance {
        Balance {
            amount: Money::from_cents(cents),
            currency_code: Some("EUR".to_string()),
            currency_desc: None,
            last_modified: None,
        }
    }

    fn member(plate: &str, action_id: Option<&str>) -> Member {
        let actions = action_id
            .map(|id| {
                vec![Action {
                    id: Some(id.to_string()),
                    state: ActionState::Active,
                    plate: Some(plate.to_string()),
                    start: chrono::NaiveDate::from_ymd_opt(2026, 2, 20)
                        .unwrap()
                        .and_hms_opt(14, 30, 0)
                        .unwrap(),
                    end: None,
                    location: None,
                    cost: None,
                }]
            })
            .unwrap_or_default();
        Member {
            id: format!("m-{plate}"),
            plate: plate.to_string(),
            kind: MemberKind::Visitor,
            nickname: None,
            actions,
        }
    }

    #[derive(Default)]
    struct MockApi {
        products: StdMutex<Vec<Product>>,
        members: StdMutex<HashMap<String, Vec<Member>>>,
        balance_cents: StdMutex<HashMap<String, i64>>,
        fail_list: AtomicBool,
        fail_detail: StdMutex<HashSet<String>>,
        fail_favorite: AtomicBool,
        start_cost_cents: StdMutex<Option<i64>>,
        start_delay: StdMutex<Option<Duration>>,
        calls: StdMutex<Vec<String>>,
    }

    impl MockApi {
        fn with_products(ids: &[&str]) -> Self {
            let mock = MockApi::default();
            *mock.products.lock().unwrap() = ids.iter().map(|id| product(id)).collect();
            let mut cents = HashMap::new();
            for id in ids {
                cents.insert(id.to_string(), 1000);
            }
            *mock.balance_cents.lock().unwrap() = cents;
            *mock.start_cost_cents.lock().unwrap() = Some(94);
            mock
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|call| call.starts_with(prefix))
                .count()
        }
    }

    impl ParkingApi for MockApi {
        fn list_products(&self) -> impl Future<Output = net::Result<Vec<Product>>> + Send {
            self.record("list");
            let result = if self.fail_list.load(Ordering::Relaxed) {
                Err(transport_error())
            } else {
                Ok(self.products.lock().unwrap().clone())
            };
            async move { result }
        }

        fn product_detail(
            &self,
            product_id: &str,
        ) -> impl Future<Output = net::Result<(Product, Vec<Member>)>> + Send {
            self.record(format!("detail:{product_id}"));
            let result = if self.fail_detail.lock().unwrap().contains(product_id) {
                Err(transport_error())
            } else {
                let members = self
                    .members
                    .lock()
                    .unwrap()
                    .get(product_id)
                    .cloned()
                    .unwrap_or_default();
                Ok((product(product_id), members))
            };
            async move { result }
        }

        fn balance(&self, product_id: &str) -> impl Future<Output = net::Result<Balance>> + Send {
            self.record(format!("balance:{product_id}"));
            let cents = self
                .balance_cents
                .lock()
                .unwrap()
                .get(product_id)
                .copied()
                .unwrap_or(0);
            async move { Ok(balance(cents)) }
        }

        fn start_action(
            &self,
            product_id: &str,
            plate: &str,
            _start: NaiveDateTime,
            _end: Option<NaiveDateTime>,
            location: &str,
        ) -> impl Future<Output = net::Result<Money>> + Send {
            self.record(format!("start:{product_id}:{plate}:{location}"));
            let cost = *self.start_cost_cents.lock().unwrap();
            let delay = *self.start_delay.lock().unwrap();
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match cost {
                    Some(cents) => Ok(Money::from_cents(cents)),
                    None => Err(net::Error::domain(
                        "ATN_ALREADY_ACTIVE",
                        "Kenteken is al actief",
                    )),
                }
            }
        }

        fn stop_action(
            &self,
            product_id: &str,
            action_id: &str,
        ) -> impl Future<Output = net::Result<()>> + Send {
            self.record(format!("stop:{product_id}:{action_id}"));
            async move { Ok(()) }
        }

        fn set_favorite(
            &self,
            product_id: &str,
            plate: &str,
            _nickname: &str,
            add: bool,
        ) -> impl Future<Output = net::Result<()>> + Send {
            self.record(format!("favorite:{product_id}:{plate}:{add}"));
            let fail = self.fail_favorite.load(Ordering::Relaxed);
            async move {
                if fail {
                    Err(net::Error::domain("FVT_REJECTED", "favorite rejected"))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn coordinator(mock: MockApi) -> Coordinator<MockApi> {
        init_tracing();
        Coordinator::new(Config::new("visitor@example.nl", "hunter2"), mock).unwrap()
    }

    #[tokio::test]
    async fn refresh_publishes_full_snapshot() {
        let coordinator = coordinator(MockApi::with_products(&["BDABZRG_1317$100", "BDABZRG_1317$200"]));
        assert_eq!(coordinator.state(), SyncState::Uninitialized);

        let snapshot = coordinator.refresh(true).await.unwrap();
        assert_eq!(snapshot.products.len(), 2);
        assert_eq!(coordinator.state(), SyncState::Ready);
        let state = snapshot.get("BDABZRG_1317$100").unwrap();
        assert_eq!(state.balance.amount, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn per_product_failure_keeps_previous_data() {
        let mock = MockApi::with_products(&["p1", "p2"]);
        mock.balance_cents.lock().unwrap().insert("p2".to_string(), 2000);
        let coordinator = coordinator(mock);

        coordinator.refresh(true).await.unwrap();

        {
            let mock = &coordinator.api;
            mock.balance_cents.lock().unwrap().insert("p1".to_string(), 1500);
            mock.fail_detail.lock().unwrap().insert("p2".to_string());
        }

        // Partial failure still publishes and still counts as a success.
        let snapshot = coordinator.refresh(true).await.unwrap();
        assert_eq!(coordinator.state(), SyncState::Ready);
        assert_eq!(
            snapshot.get("p1").unwrap().balance.amount,
            Money::from_cents(1500)
        );
        assert_eq!(
            snapshot.get("p2").unwrap().balance.amount,
            Money::from_cents(2000)
        );
    }

    #[tokio::test]
    async fn unforced_refresh_within_interval_reuses_snapshot() {
        let coordinator = coordinator(MockApi::with_products(&["p1"]));

        coordinator.refresh(false).await.unwrap();
        assert_eq!(coordinator.api.count("list"), 1);

        coordinator.refresh(false).await.unwrap();
        assert_eq!(coordinator.api.count("list"), 1);

        coordinator.refresh(true).await.unwrap();
        assert_eq!(coordinator.api.count("list"), 2);
    }

    #[tokio::test]
    async fn start_parking_returns_cost_and_forces_refresh() {
        let coordinator = coordinator(MockApi::with_products(&["p1"]));
        coordinator.refresh(true).await.unwrap();
        let lists_before = coordinator.api.count("list");

        let end = chrono::NaiveDate::from_ymd_opt(2026, 2, 20)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let cost = coordinator
            .start_parking("p1", "HRL96K", Some(end), None)
            .await
            .unwrap();
        assert_eq!(cost, Money::from_cents(94));
        assert_eq!(coordinator.api.count("start:p1:HRL96K:BDA1317"), 1);
        assert_eq!(coordinator.api.count("list"), lists_before + 1);
        assert_eq!(coordinator.api.count("favorite"), 0);
    }

    #[tokio::test]
    async fn start_parking_derives_location_before_first_refresh() {
        // No snapshot yet; the location falls back to the product id.
        let coordinator = coordinator(MockApi::with_products(&["BDABZRG_1317$100"]));

        coordinator
            .start_parking("BDABZRG_1317$100", "HRL96K", None, None)
            .await
            .unwrap();
        assert_eq!(
            coordinator.api.count("start:BDABZRG_1317$100:HRL96K:BDA1317"),
            1
        );
    }

    #[tokio::test]
    async fn start_rejection_skips_refresh() {
        let mock = MockApi::with_products(&["p1"]);
        *mock.start_cost_cents.lock().unwrap() = None;
        let coordinator = coordinator(mock);
        coordinator.refresh(true).await.unwrap();
        let lists_before = coordinator.api.count("list");

        let err = coordinator
            .start_parking("p1", "HRL96K", None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api(net::Error::Domain { ref code, .. }) if code == "ATN_ALREADY_ACTIVE"
        ));
        assert_eq!(coordinator.api.count("list"), lists_before);
    }

    #[tokio::test]
    async fn favorite_failure_does_not_undo_start() {
        let mock = MockApi::with_products(&["p1"]);
        mock.fail_favorite.store(true, Ordering::Relaxed);
        let coordinator = coordinator(mock);
        coordinator.refresh(true).await.unwrap();

        let cost = coordinator
            .start_parking("p1", "HRL96K", None, Some("Mats"))
            .await
            .unwrap();
        assert_eq!(cost, Money::from_cents(94));
        assert_eq!(coordinator.api.count("favorite:p1:HRL96K:true"), 1);
    }

    #[tokio::test]
    async fn stop_resolves_action_id_from_snapshot() {
        let mock = MockApi::with_products(&["p1"]);
        mock.members
            .lock()
            .unwrap()
            .insert("p1".to_string(), vec![member("HRL96K", Some("a9"))]);
        let coordinator = coordinator(mock);
        coordinator.refresh(true).await.unwrap();

        coordinator.stop_parking("p1", "HRL96K").await.unwrap();
        assert_eq!(coordinator.api.count("stop:p1:a9"), 1);
    }

    #[tokio::test]
    async fn stop_without_active_session_fails_locally() {
        let mock = MockApi::with_products(&["p1"]);
        mock.members
            .lock()
            .unwrap()
            .insert("p1".to_string(), vec![member("HRL96K", None)]);
        let coordinator = coordinator(mock);
        coordinator.refresh(true).await.unwrap();
        let calls_before = coordinator.api.calls.lock().unwrap().len();

        let err = coordinator.stop_parking("p1", "HRL96K").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Api(net::Error::Domain { ref code, .. }) if code == "ATN_NOT_ACTIVE"
        ));
        // Resolved locally; nothing went upstream.
        assert_eq!(coordinator.api.calls.lock().unwrap().len(), calls_before);
    }

    #[tokio::test]
    async fn concurrent_mutations_are_rejected() {
        let mock = MockApi::with_products(&["p1"]);
        *mock.start_delay.lock().unwrap() = Some(Duration::from_millis(100));
        let coordinator = Arc::new(coordinator(mock));
        coordinator.refresh(true).await.unwrap();

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator.start_parking("p1", "HRL96K", None, None).await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = coordinator
            .start_parking("p1", "JJ123B", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MutationInFlight));

        first.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn degrades_after_three_failures_and_recovers() {
        let mock = MockApi::with_products(&["p1"]);
        mock.fail_list.store(true, Ordering::Relaxed);
        let coordinator = coordinator(mock);

        for _ in 0..2 {
            coordinator.refresh(true).await.unwrap_err();
            assert_ne!(coordinator.state(), SyncState::Degraded);
        }
        coordinator.refresh(true).await.unwrap_err();
        assert_eq!(coordinator.state(), SyncState::Degraded);
        assert_eq!(
            coordinator.poll_delay(),
            coordinator.config.poll_interval() * DEGRADED_BACKOFF_FACTOR
        );

        coordinator.api.fail_list.store(false, Ordering::Relaxed);
        coordinator.refresh(true).await.unwrap();
        assert_eq!(coordinator.state(), SyncState::Ready);
        assert_eq!(coordinator.poll_delay(), coordinator.config.poll_interval());
    }

    #[tokio::test]
    async fn auth_failure_during_product_fetch_fails_the_cycle() {
        struct AuthFailApi {
            inner: MockApi,
        }

        impl ParkingApi for AuthFailApi {
            fn list_products(&self) -> impl Future<Output = net::Result<Vec<Product>>> + Send {
                self.inner.list_products()
            }
            fn product_detail(
                &self,
                product_id: &str,
            ) -> impl Future<Output = net::Result<(Product, Vec<Member>)>> + Send {
                self.inner.record(format!("detail:{product_id}"));
                async move { Err(net::Error::Auth("session rejected twice".to_string())) }
            }
            fn balance(
                &self,
                product_id: &str,
            ) -> impl Future<Output = net::Result<Balance>> + Send {
                self.inner.balance(product_id)
            }
            fn start_action(
                &self,
                product_id: &str,
                plate: &str,
                start: NaiveDateTime,
                end: Option<NaiveDateTime>,
                location: &str,
            ) -> impl Future<Output = net::Result<Money>> + Send {
                self.inner.start_action(product_id, plate, start, end, location)
            }
            fn stop_action(
                &self,
                product_id: &str,
                action_id: &str,
            ) -> impl Future<Output = net::Result<()>> + Send {
                self.inner.stop_action(product_id, action_id)
            }
            fn set_favorite(
                &self,
                product_id: &str,
                plate: &str,
                nickname: &str,
                add: bool,
            ) -> impl Future<Output = net::Result<()>> + Send {
                self.inner.set_favorite(product_id, plate, nickname, add)
            }
        }

        init_tracing();
        let api = AuthFailApi {
            inner: MockApi::with_products(&["p1", "p2"]),
        };
        let coordinator = Coordinator::new(Config::new("visitor@example.nl", "hunter2"), api).unwrap();

        let err = coordinator.refresh(true).await.unwrap_err();
        assert!(err.is_auth());
        // Nothing was published for the failed cycle.
        assert!(coordinator.current_snapshot().products.is_empty());
    }
}
