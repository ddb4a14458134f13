//! Snapshot - the coordinator's published consistent view

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::balance::Balance;
use super::member::Member;
use super::product::Product;

/// Everything currently known about one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductState {
    pub product: Product,
    pub members: Vec<Member>,
    pub balance: Balance,
}

impl ProductState {
    /// Number of plates currently parked under this product.
    pub fn active_parking_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_active()).count()
    }

    pub fn member_by_plate(&self, plate: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.plate == plate)
    }
}

/// The coordinator's current consistent view across all products.
///
/// Only ever replaced atomically as a whole; observers never see a mix of
/// old and new data for the same product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub products: BTreeMap<String, ProductState>,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            products: BTreeMap::new(),
            taken_at: Utc::now(),
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&ProductState> {
        self.products.get(product_id)
    }

    /// Total active parking sessions across all products.
    pub fn total_active_parking(&self) -> usize {
        self.products.values().map(ProductState::active_parking_count).sum()
    }

    /// How stale this snapshot is. Observers use this instead of discrete
    /// error events when periodic refreshes fail.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.taken_at
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}
