//! Twopark Core Library
//!
//! Parameter codec, exact money handling, and the domain model for the
//! 2Park parking service. Everything here is pure and synchronous; the
//! network layer lives in `twopark-net`.

pub mod codec;
pub mod error;
pub mod models;
pub mod money;

pub use codec::{parse_flag, ParamSet, Parameter, Value, DATETIME_FORMAT};
pub use error::CodecError;
pub use models::*;
pub use money::Money;
