//! Polling and reconciliation for 2Park accounts.
//!
//! Builds on `twopark-net`: a [`Coordinator`] periodically pulls the
//! account's products, member rosters, and balances into an immutable
//! [`twopark_core::Snapshot`], and drives the start/stop parking flows
//! with a forced refresh after each mutation.
//!
//! ```no_run
//! use twopark_sync::{Config, Coordinator};
//!
//! # async fn run() -> twopark_sync::Result<()> {
//! let config = Config::from_toml_str(
//!     r#"
//!     email = "visitor@example.nl"
//!     password = "hunter2"
//!     poll_interval_minutes = 5
//!     "#,
//! )?;
//! let coordinator = std::sync::Arc::new(Coordinator::from_config(config)?);
//! tokio::spawn(coordinator.clone().run());
//! let snapshot = coordinator.refresh(true).await?;
//! println!("{} products", snapshot.products.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;

pub use api::ParkingApi;
pub use config::{Config, ConfigError};
pub use coordinator::{Coordinator, RefreshReport, SyncState};
pub use error::{Error, Result};
