//! Typed API client for the 2Park endpoints
//!
//! One method per upstream capability, each a thin composition over the
//! session transport and the parameter codec. No retries happen here
//! beyond the transport's single re-auth retry; retrying domain failures
//! is the coordinator's call.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};
use tracing::{debug, warn};

use twopark_core::codec::{parse_datetime, parse_flag};
use twopark_core::{
    Action, ActionState, Balance, CodecError, Member, MemberKind, Money, ParamSet, Product,
    ProductCapabilities, Value,
};

use crate::error::{Error, Result};
use crate::protocol::{
    endpoints, ActiveActionsData, BalanceData, CategoriesData, RawAction, RawMember, RawProduct,
    StartActionData, VersionData,
};
use crate::transport::{Credentials, SessionTransport};

/// Session-authenticated client for the 2Park JSON API.
pub struct ApiClient {
    transport: SessionTransport,
}

impl ApiClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self {
            transport: SessionTransport::new(credentials)?,
        })
    }

    /// Point the client at a different base URL (tests, acceptance envs).
    pub fn with_base_url(credentials: Credentials, base_url: &str) -> Result<Self> {
        Ok(Self {
            transport: SessionTransport::with_base_url(credentials, base_url)?,
        })
    }

    /// Establish a session now. Fails with `Error::Auth` on bad credentials.
    pub async fn login(&self) -> Result<()> {
        self.transport.authenticate().await
    }

    /// All products of the account, flattened across categories.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let payload = self.transport.call(endpoints::CATEGORIES, &[], None).await?;
        let data: CategoriesData = from_payload(payload)?;
        let products: Vec<Product> = data
            .categories
            .into_iter()
            .flat_map(|category| category.cty_products)
            .map(product_from_raw)
            .collect();
        debug!(count = products.len(), "listed products");
        Ok(products)
    }

    /// Fresh product metadata plus its member plates.
    pub async fn product_detail(&self, product_id: &str) -> Result<(Product, Vec<Member>)> {
        let payload = self
            .transport
            .call(endpoints::PRODUCT_DETAIL, &[("product_id", product_id)], None)
            .await?;
        let raw: RawProduct = from_payload(payload)?;
        let members = members_from_detail(&raw);
        Ok((product_from_raw(raw), members))
    }

    pub async fn balance(&self, product_id: &str) -> Result<Balance> {
        let payload = self
            .transport
            .call(endpoints::BALANCE, &[("product_id", product_id)], None)
            .await?;
        let data: BalanceData = from_payload(payload)?;
        let params = ParamSet::decode(&data.balance.ble_parameters)?;
        Ok(Balance::from_params(&params)?)
    }

    /// Start a parking session; returns the upstream's estimated cost.
    ///
    /// The action id is not returned inline; it appears in the next detail
    /// refresh.
    pub async fn start_action(
        &self,
        product_id: &str,
        plate: &str,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        location: &str,
    ) -> Result<Money> {
        let mut params = ParamSet::new();
        params.push("MBR_IDENT", Value::Text(plate.to_string()));
        params.push("TIMESTART", Value::DateTime(start));
        if let Some(end) = end {
            params.push("TIMEEND", Value::DateTime(end));
        }
        params.push("LOCATION", Value::Text(location.to_string()));
        let data = json!({ "action": { "atn_parameters": params.encode() } });

        let payload = self
            .transport
            .call(
                endpoints::START_ACTION,
                &[("product_id", product_id)],
                Some(&data),
            )
            .await?;
        let data: StartActionData = from_payload(payload)?;
        let params = ParamSet::decode(&data.action.atn_parameters)?;
        params
            .money("AMOUNT")
            .ok_or_else(|| Error::Codec(CodecError::MissingParameter("AMOUNT".to_string())))
    }

    /// Stop a running action by its upstream id.
    pub async fn stop_action(&self, product_id: &str, action_id: &str) -> Result<()> {
        self.transport
            .call(
                endpoints::STOP_ACTION,
                &[("product_id", product_id), ("action_id", action_id)],
                None,
            )
            .await?;
        Ok(())
    }

    /// Save or remove a favorite plate/nickname pair.
    ///
    /// The remove form is inferred by analogy with add and has not been
    /// observed against the live service.
    pub async fn set_favorite(
        &self,
        product_id: &str,
        plate: &str,
        nickname: &str,
        add: bool,
    ) -> Result<()> {
        let mut params = ParamSet::new();
        params.push("MBR_IDENT", Value::Text(plate.to_string()));
        params.push("NICKNAME", Value::Text(nickname.to_string()));
        let data = json!({
            "favorite": {
                "fvt_action": if add { "ADD" } else { "REMOVE" },
                "fvt_parameters": params.encode(),
            }
        });
        self.transport
            .call(endpoints::FAVORITE, &[("product_id", product_id)], Some(&data))
            .await?;
        Ok(())
    }

    /// All currently active actions across the account's products.
    pub async fn list_active_sessions(&self) -> Result<Vec<Action>> {
        let payload = self
            .transport
            .call(endpoints::ACTIVE_ACTIONS, &[], None)
            .await?;
        let data: ActiveActionsData = from_payload(payload)?;
        let mut actions = Vec::with_capacity(data.actions.len());
        for raw in &data.actions {
            match action_from_raw(raw) {
                Ok(action) => actions.push(action),
                Err(err) => warn!(error = %err, "skipping malformed active action"),
            }
        }
        Ok(actions)
    }

    /// Upstream version string (the protocol's one GET, unauthenticated).
    pub async fn version(&self) -> Result<String> {
        let payload = self.transport.version().await?;
        let data: VersionData = from_payload(payload)?;
        Ok(data.version)
    }
}

fn from_payload<T: DeserializeOwned>(payload: Json) -> Result<T> {
    Ok(serde_json::from_value(payload)?)
}

fn product_from_raw(raw: RawProduct) -> Product {
    let location = raw
        .pdt_parameter_groups
        .iter()
        .flat_map(|group| &group.pgr_parameters)
        .find(|param| param.label == "LOCATION" && !param.value.is_empty())
        .map(|param| param.value.clone());

    Product {
        valid_from: raw.pdt_valid_from.as_deref().and_then(parse_datetime),
        valid_to: raw.pdt_valid_to.as_deref().and_then(parse_datetime),
        blocked: raw
            .pdt_is_blocked
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or(false),
        capabilities: ProductCapabilities::parse(raw.pdt_options.as_deref().unwrap_or("")),
        max_members: raw.pdt_member_pool_max_registered,
        max_active_members: raw.pdt_member_pool_max_active,
        location,
        id: raw.pdt_id,
        name: raw.pdt_name,
    }
}

/// Pick the member records relevant to this product kind: fixed plates
/// (`FLPN`) live under identifications on resident permits, visitor plates
/// (`LPN`) directly under the product.
fn members_from_detail(raw: &RawProduct) -> Vec<Member> {
    let capabilities = ProductCapabilities::parse(raw.pdt_options.as_deref().unwrap_or(""));

    let selected: Vec<&RawMember> = if capabilities.has_fixed_plate {
        let mut seen = HashSet::new();
        raw.pdt_identifications
            .iter()
            .flat_map(|identification| &identification.idn_members)
            .filter(|member| member.mbr_type.as_deref() == Some("FLPN"))
            .filter(|member| seen.insert(member.mbr_id.as_str()))
            .collect()
    } else {
        raw.pdt_members
            .iter()
            .filter(|member| member.mbr_type.as_deref() == Some("LPN"))
            .collect()
    };

    let mut members = Vec::with_capacity(selected.len());
    for raw_member in selected {
        match member_from_raw(raw_member) {
            Ok(member) => members.push(member),
            // Codec failures stay isolated to the offending record.
            Err(err) => warn!(member = %raw_member.mbr_id, error = %err, "skipping malformed member"),
        }
    }
    members
}

fn member_from_raw(raw: &RawMember) -> Result<Member> {
    let params = ParamSet::decode(&raw.mbr_parameters)?;
    let mut actions = Vec::with_capacity(raw.mbr_actions.len());
    for raw_action in &raw.mbr_actions {
        match action_from_raw(raw_action) {
            Ok(action) => actions.push(action),
            Err(err) => warn!(member = %raw.mbr_id, error = %err, "skipping malformed action"),
        }
    }
    Ok(Member {
        id: raw.mbr_id.clone(),
        plate: raw.mbr_identifier.clone(),
        kind: raw
            .mbr_type
            .as_deref()
            .and_then(MemberKind::from_wire)
            .unwrap_or(MemberKind::Visitor),
        nickname: params.text("NICKNAME").map(str::to_string),
        actions,
    })
}

fn action_from_raw(raw: &RawAction) -> Result<Action> {
    let state = raw
        .atn_state
        .as_deref()
        .and_then(ActionState::from_wire)
        .unwrap_or(ActionState::Active);
    let params = ParamSet::decode(&raw.atn_parameters)?;
    Ok(Action::from_params(raw.atn_id.clone(), state, &params)?)
}
