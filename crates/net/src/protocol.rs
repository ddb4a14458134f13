//! Wire types for the 2Park JSON API
//!
//! Every response is wrapped in the same envelope:
//! `{status: {code: {major, minor}, message}, data: {...}}` with
//! `major ∈ {OK, ERROR}`. Payload records carry their structured fields as
//! flat parameter arrays (see `twopark_core::codec`).

use serde::Deserialize;
use serde_json::Value as Json;

use twopark_core::Parameter;

/// Minor status code the upstream uses when the session cookie is no
/// longer valid. Observed-by-assumption; the upstream has no published
/// contract.
pub const MINOR_NOT_AUTHENTICATED: &str = "NOT_AUTHENTICATED";

/// Upstream endpoint file names.
pub mod endpoints {
    pub const LOGIN: &str = "check_credentials.json";
    pub const CATEGORIES: &str = "get_categories.json";
    pub const PRODUCT_DETAIL: &str = "get_category_product_details.json";
    pub const BALANCE: &str = "get_balance.json";
    pub const START_ACTION: &str = "start_action.json";
    pub const STOP_ACTION: &str = "stop_action.json";
    pub const FAVORITE: &str = "handle_favorite.json";
    pub const ACTIVE_ACTIONS: &str = "get_active_actions.json";
    pub const VERSION: &str = "version.json";
}

/// The common response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(default)]
    pub data: Option<Json>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub code: StatusCode,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCode {
    pub major: String,
    #[serde(default)]
    pub minor: Option<String>,
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.status.code.major == "OK"
    }

    pub fn minor(&self) -> Option<&str> {
        self.status.code.minor.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.status.message.as_deref()
    }
}

/// `get_categories.json` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesData {
    #[serde(default)]
    pub categories: Vec<RawCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(default)]
    pub cty_products: Vec<RawProduct>,
}

/// A product record, both as listed under a category and as returned
/// in full by `get_category_product_details.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub pdt_id: String,
    pub pdt_name: String,
    #[serde(default)]
    pub pdt_valid_from: Option<String>,
    #[serde(default)]
    pub pdt_valid_to: Option<String>,
    #[serde(default)]
    pub pdt_is_blocked: Option<String>,
    #[serde(default)]
    pub pdt_options: Option<String>,
    #[serde(default)]
    pub pdt_member_pool_max_registered: Option<u32>,
    #[serde(default)]
    pub pdt_member_pool_max_active: Option<u32>,
    #[serde(default)]
    pub pdt_parameter_groups: Vec<RawParameterGroup>,
    /// Visitor plates (`LPN`), detail response only.
    #[serde(default)]
    pub pdt_members: Vec<RawMember>,
    /// Fixed plates (`FLPN`) on resident permits live one level deeper.
    #[serde(default)]
    pub pdt_identifications: Vec<RawIdentification>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParameterGroup {
    #[serde(default)]
    pub pgr_parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawIdentification {
    #[serde(default)]
    pub idn_members: Vec<RawMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMember {
    pub mbr_id: String,
    pub mbr_identifier: String,
    #[serde(default)]
    pub mbr_type: Option<String>,
    #[serde(default)]
    pub mbr_parameters: Vec<Parameter>,
    #[serde(default)]
    pub mbr_actions: Vec<RawAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAction {
    #[serde(default)]
    pub atn_id: Option<String>,
    #[serde(default)]
    pub atn_state: Option<String>,
    #[serde(default)]
    pub atn_parameters: Vec<Parameter>,
}

/// `get_balance.json` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceData {
    pub balance: RawBalance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBalance {
    #[serde(default)]
    pub ble_parameters: Vec<Parameter>,
}

/// `start_action.json` payload: the freshly started action, priced but
/// without an id (the id only appears in the next detail refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct StartActionData {
    pub action: RawAction,
}

/// `get_active_actions.json` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveActionsData {
    #[serde(default)]
    pub actions: Vec<RawAction>,
}

/// `version.json` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionData {
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_classifies_ok() {
        let json = r#"{"status":{"code":{"major":"OK"}},"data":{"version":"1.2.3"}}"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.is_ok());
        assert_eq!(envelope.minor(), None);
        assert!(envelope.data.is_some());
    }

    #[test]
    fn envelope_preserves_error_details() {
        let json = r#"{
            "status": {
                "code": {"major": "ERROR", "minor": "ATN_ALREADY_ACTIVE"},
                "message": "Kenteken is al actief"
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(!envelope.is_ok());
        assert_eq!(envelope.minor(), Some("ATN_ALREADY_ACTIVE"));
        assert_eq!(envelope.message(), Some("Kenteken is al actief"));
    }

    #[test]
    fn categories_flatten_to_products() {
        let json = r#"{
            "categories": [
                {"cty_products": [
                    {"pdt_id": "BDABZRG_1317$1055649", "pdt_name": "Bezoekersregeling",
                     "pdt_is_blocked": "false", "pdt_options": "MM",
                     "pdt_member_pool_max_active": 2,
                     "pdt_parameter_groups": [
                        {"pgr_parameters": [{"prr_label": "LOCATION", "prr_value": "BDA1317"}]}
                     ]}
                ]}
            ]
        }"#;
        let data: CategoriesData = serde_json::from_str(json).unwrap();
        let product = &data.categories[0].cty_products[0];
        assert_eq!(product.pdt_id, "BDABZRG_1317$1055649");
        assert_eq!(product.pdt_member_pool_max_active, Some(2));
        assert_eq!(
            product.pdt_parameter_groups[0].pgr_parameters[0].value,
            "BDA1317"
        );
    }

    #[test]
    fn detail_members_parse_with_actions() {
        let json = r#"{
            "pdt_id": "BDABZRG_1317$1055649", "pdt_name": "Bezoekersregeling",
            "pdt_members": [
                {"mbr_id": "m1", "mbr_identifier": "HRL96K", "mbr_type": "LPN",
                 "mbr_parameters": [{"prr_label": "NICKNAME", "prr_value": "Mats"}],
                 "mbr_actions": [
                    {"atn_id": "a1", "atn_state": "ACTIVE",
                     "atn_parameters": [
                        {"prr_label": "TIMESTART", "prr_value": "20-02-2026 18:15:00"},
                        {"prr_label": "AMOUNT", "prr_value": "0.94"}
                     ]}
                 ]}
            ]
        }"#;
        let raw: RawProduct = serde_json::from_str(json).unwrap();
        assert_eq!(raw.pdt_members.len(), 1);
        assert_eq!(raw.pdt_members[0].mbr_actions[0].atn_id.as_deref(), Some("a1"));
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let json = r#"{"pdt_id": "x", "pdt_name": "y", "pdt_something_new": 42}"#;
        let raw: RawProduct = serde_json::from_str(json).unwrap();
        assert_eq!(raw.pdt_id, "x");
        assert!(raw.pdt_members.is_empty());
    }
}
