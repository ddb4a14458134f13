//! Parking action (one parking session instance)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::codec::ParamSet;
use crate::error::CodecError;
use crate::money::Money;

/// Lifecycle state of a parking action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionState {
    Active,
    Completed,
}

impl ActionState {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(ActionState::Active),
            "COMPLETED" => Some(ActionState::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ActionState::Completed)
    }
}

/// One parking session tied to a member plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Assigned by the upstream on start; required to stop. Not returned
    /// inline by the start call, so freshly started actions carry `None`
    /// until the next detail refresh.
    pub id: Option<String>,
    pub state: ActionState,
    pub plate: Option<String>,
    pub start: NaiveDateTime,
    /// Open-ended sessions have no end timestamp.
    pub end: Option<NaiveDateTime>,
    pub location: Option<String>,
    /// Present once the upstream has priced the session.
    pub cost: Option<Money>,
}

impl Action {
    /// Assemble an action from its decoded parameter set.
    pub fn from_params(
        id: Option<String>,
        state: ActionState,
        params: &ParamSet,
    ) -> Result<Self, CodecError> {
        let start = params
            .datetime("TIMESTART")
            .ok_or_else(|| CodecError::MissingParameter("TIMESTART".to_string()))?;
        Ok(Action {
            id,
            state,
            plate: params.text("MBR_IDENT").map(str::to_string),
            start,
            end: params.datetime("TIMEEND"),
            location: params.text("LOCATION").map(str::to_string),
            cost: params.money("AMOUNT"),
        })
    }
}
