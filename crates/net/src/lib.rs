//! Twopark Network Library
//!
//! Session-authenticated HTTP client for the 2Park JSON API.
//!
//! # Architecture
//!
//! - **Transport**: form-encoded POSTs with cookie session affinity and a
//!   single transparent re-authentication retry
//! - **Client**: one typed method per upstream endpoint
//! - **Protocol**: the `{status, data}` envelope and raw payload records
//!
//! # Usage
//!
//! ```ignore
//! let client = ApiClient::new(Credentials::new("me@example.nl", "secret"))?;
//! client.login().await?;
//!
//! for product in client.list_products().await? {
//!     let balance = client.balance(&product.id).await?;
//!     println!("{}: {}", product.name, balance.amount);
//! }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

pub use client::ApiClient;
pub use error::{Error, Result};
pub use transport::{Credentials, SessionTransport, DEFAULT_BASE_URL};
