//! Coordinator configuration.
//!
//! One [`Config`] per 2Park account. Loadable from TOML or built
//! programmatically; validated before the coordinator accepts it.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use twopark_net::Credentials;

/// Default polling cadence in minutes.
pub const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 5;
/// Lower bound for the polling cadence.
pub const MIN_POLL_INTERVAL_MINUTES: u64 = 1;
/// Upper bound for the polling cadence.
pub const MAX_POLL_INTERVAL_MINUTES: u64 = 60;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("poll interval must be between 1 and 60 minutes, got {0}")]
    IntervalOutOfRange(u64),

    #[error("email must not be empty")]
    MissingEmail,

    #[error("password must not be empty")]
    MissingPassword,

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Account credentials and polling cadence for one coordinator.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub email: String,
    pub password: String,

    /// Minutes between periodic refresh cycles. Clamped to 1..=60 by
    /// [`Config::validate`].
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,

    /// Upstream base URL override, used by acceptance environments.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MINUTES
}

impl Config {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            poll_interval_minutes: DEFAULT_POLL_INTERVAL_MINUTES,
            base_url: None,
        }
    }

    /// Parses and validates a TOML configuration document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(ConfigError::MissingEmail);
        }
        if self.password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        if !(MIN_POLL_INTERVAL_MINUTES..=MAX_POLL_INTERVAL_MINUTES)
            .contains(&self.poll_interval_minutes)
        {
            return Err(ConfigError::IntervalOutOfRange(self.poll_interval_minutes));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes * 60)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.as_str(), self.password.as_str())
    }
}
