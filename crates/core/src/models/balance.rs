//! Balance model - the remaining credit of a product

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::codec::ParamSet;
use crate::error::CodecError;
use crate::money::Money;

/// The remaining balance of one product.
///
/// Replaced wholesale on each refresh, never computed locally from deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: Money,
    /// `"EUR"` for monetary products, `"TIMES"` for prepaid session bundles.
    pub currency_code: Option<String>,
    pub currency_desc: Option<String>,
    pub last_modified: Option<NaiveDateTime>,
}

impl Balance {
    /// Assemble from the decoded `ble_parameters` set.
    pub fn from_params(params: &ParamSet) -> Result<Self, CodecError> {
        let amount = params
            .money("AMOUNT")
            .ok_or_else(|| CodecError::MissingParameter("AMOUNT".to_string()))?;
        Ok(Balance {
            amount,
            currency_code: params.text("CURRENCY_CODE").map(str::to_string),
            currency_desc: params.text("CURRENCY_DESC").map(str::to_string),
            last_modified: params.datetime("LAST_MODIFIED"),
        })
    }

    /// Whether this balance counts sessions rather than money.
    pub fn is_session_bundle(&self) -> bool {
        self.currency_code.as_deref() == Some("TIMES")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Parameter;

    #[test]
    fn assembles_from_parameters() {
        let params = ParamSet::decode(&[
            Parameter::new("AMOUNT", "19.20"),
            Parameter::new("CURRENCY_CODE", "EUR"),
            Parameter::new("CURRENCY_DESC", "Euro"),
            Parameter::new("LAST_MODIFIED", "20-02-2026 18:15:00"),
        ])
        .unwrap();
        let balance = Balance::from_params(&params).unwrap();
        assert_eq!(balance.amount.to_string(), "19.20");
        assert_eq!(balance.currency_code.as_deref(), Some("EUR"));
        assert!(balance.last_modified.is_some());
        assert!(!balance.is_session_bundle());
    }

    #[test]
    fn session_bundles_use_times() {
        let params = ParamSet::decode(&[
            Parameter::new("AMOUNT", "12.00"),
            Parameter::new("CURRENCY_CODE", "TIMES"),
        ])
        .unwrap();
        assert!(Balance::from_params(&params).unwrap().is_session_bundle());
    }

    #[test]
    fn missing_amount_is_an_error() {
        let params = ParamSet::decode(&[Parameter::new("CURRENCY_CODE", "EUR")]).unwrap();
        assert_eq!(
            Balance::from_params(&params).unwrap_err(),
            CodecError::MissingParameter("AMOUNT".to_string())
        );
    }
}
