//! Product model - a parking permit/scheme owned by the account

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Capability tokens carried in the product's `pdt_options` string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCapabilities {
    pub can_manage_members: bool,
    pub has_fixed_plate: bool,
    pub can_extend: bool,
}

impl ProductCapabilities {
    /// Parse the comma-separated option tokens (`"MM,FLPN"`).
    pub fn parse(options: &str) -> Self {
        let mut caps = Self::default();
        for token in options.split(',').map(str::trim) {
            match token {
                "MM" => caps.can_manage_members = true,
                "FLPN" => caps.has_fixed_plate = true,
                "EXTEND" => caps.can_extend = true,
                _ => {}
            }
        }
        caps
    }
}

/// A permit/scheme owned by the account.
///
/// Fetched fresh on every full refresh and replaced wholesale; never mutated
/// locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Structured as `{type}_{locationId}${accountId}`.
    pub id: String,
    pub name: String,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_to: Option<NaiveDateTime>,
    pub blocked: bool,
    pub capabilities: ProductCapabilities,
    pub max_members: Option<u32>,
    pub max_active_members: Option<u32>,
    /// Location code from the product's `LOCATION` parameter, if present.
    pub location: Option<String>,
}

impl Product {
    /// The location code to start actions with: the declared `LOCATION`
    /// parameter, or derived from the id (`BDABZRG_1317$…` → `BDA1317`).
    pub fn location_code(&self) -> Option<String> {
        self.location
            .clone()
            .or_else(|| derive_location(&self.id))
    }
}

/// Derive a location code from a product id of the form `BDA…_{digits}$…`.
pub fn derive_location(product_id: &str) -> Option<String> {
    let (head, _) = product_id.split_once('$')?;
    let (scheme, digits) = head.rsplit_once('_')?;
    if !scheme.starts_with("BDA") || digits.is_empty() {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("BDA{digits}"))
}
