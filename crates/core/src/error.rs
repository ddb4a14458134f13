//! Error types for Twopark Core

use thiserror::Error;

/// A malformed field in an otherwise well-formed parameter array.
///
/// Always names the offending label so callers can decide whether to drop
/// the single record or fail the whole response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid money value {value:?} for parameter {label}")]
    InvalidMoney { label: String, value: String },

    #[error("invalid datetime value {value:?} for parameter {label} (expected dd-MM-yyyy HH:mm:ss)")]
    InvalidDateTime { label: String, value: String },

    #[error("invalid 4-digit value {value:?} for parameter {label}")]
    InvalidDigits { label: String, value: String },

    #[error("missing required parameter {0}")]
    MissingParameter(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
