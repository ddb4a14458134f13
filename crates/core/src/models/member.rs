//! Member model - a license plate registered under a product

use serde::{Deserialize, Serialize};

use super::action::Action;

/// Kind of plate registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberKind {
    /// Changeable visitor plate (`LPN`).
    Visitor,
    /// Fixed owner plate on a resident permit (`FLPN`).
    Fixed,
}

impl MemberKind {
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "LPN" => Some(MemberKind::Visitor),
            "FLPN" => Some(MemberKind::Fixed),
            _ => None,
        }
    }
}

/// A license plate entry under a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub plate: String,
    pub kind: MemberKind,
    /// Favorite label, from the `NICKNAME` parameter.
    pub nickname: Option<String>,
    /// Currently known actions for this plate.
    pub actions: Vec<Action>,
}

impl Member {
    /// Whether this plate is currently parked.
    ///
    /// Computed from the action list, never stored, so it cannot drift out
    /// of sync with the underlying actions.
    pub fn is_active(&self) -> bool {
        self.actions.iter().any(|a| !a.state.is_terminal())
    }

    /// The first non-terminal action, if any.
    pub fn active_action(&self) -> Option<&Action> {
        self.actions.iter().find(|a| !a.state.is_terminal())
    }

    /// Display form: `"HRL96K (Mats)"` when a nickname exists, else the plate.
    pub fn display_option(&self) -> String {
        match &self.nickname {
            Some(nick) => format!("{} ({nick})", self.plate),
            None => self.plate.clone(),
        }
    }
}

/// Extract the plate from a display option like `"HRL96K (Mats)"`.
pub fn extract_plate(option: &str) -> &str {
    option.split(" (").next().unwrap_or(option)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::ActionState;
    use chrono::NaiveDate;

    fn action(state: ActionState) -> Action {
        Action {
            id: Some("atn-1".to_string()),
            state,
            plate: Some("HRL96K".to_string()),
            start: NaiveDate::from_ymd_opt(2026, 2, 20)
                .unwrap()
                .and_hms_opt(18, 15, 0)
                .unwrap(),
            end: None,
            location: None,
            cost: None,
        }
    }

    fn member(actions: Vec<Action>) -> Member {
        Member {
            id: "mbr-1".to_string(),
            plate: "HRL96K".to_string(),
            kind: MemberKind::Visitor,
            nickname: None,
            actions,
        }
    }

    #[test]
    fn no_actions_means_not_parked() {
        assert!(!member(vec![]).is_active());
    }

    #[test]
    fn one_active_action_means_parked() {
        assert!(member(vec![action(ActionState::Active)]).is_active());
    }

    #[test]
    fn only_completed_actions_means_not_parked() {
        let m = member(vec![
            action(ActionState::Completed),
            action(ActionState::Completed),
        ]);
        assert!(!m.is_active());
        assert!(m.active_action().is_none());
    }

    #[test]
    fn display_option_includes_nickname() {
        let mut m = member(vec![]);
        assert_eq!(m.display_option(), "HRL96K");
        m.nickname = Some("Mats".to_string());
        assert_eq!(m.display_option(), "HRL96K (Mats)");
        assert_eq!(extract_plate("HRL96K (Mats)"), "HRL96K");
        assert_eq!(extract_plate("HRL96K"), "HRL96K");
    }
}
