//! Coordinator error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Anything the upstream client reported: transport, auth, or an
    /// explicit rejection.
    #[error(transparent)]
    Api(#[from] twopark_net::Error),

    /// A start or stop flow is already running for this account.
    #[error("another parking mutation is already in flight")]
    MutationInFlight,

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl Error {
    /// True when the session could not be (re)established and the account
    /// needs attention rather than a retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Api(err) if err.is_auth())
    }
}
