//! Data models for the 2Park domain

mod action;
mod balance;
mod member;
mod product;
mod snapshot;

pub use action::*;
pub use balance::*;
pub use member::*;
pub use product::*;
pub use snapshot::*;
