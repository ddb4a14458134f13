//! Network error types

use twopark_core::CodecError;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the 2Park API layer.
///
/// The three outcome classes of the response envelope are never conflated:
/// network/body failures are `Transport`/`Json`, explicit upstream
/// rejections are `Domain`, and exhausted authentication is `Auth`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or timeout failure, including an unreadable response body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A body that was received but does not match the expected shape.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    /// Credentials rejected, or the session was still rejected after the
    /// single re-authentication retry.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The upstream explicitly rejected the request. Code and message are
    /// preserved verbatim for display.
    #[error("upstream rejected request ({code}): {message}")]
    Domain { code: String, message: String },

    /// A malformed field inside an otherwise successful response.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl Error {
    pub fn domain(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Domain {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Error::Domain { .. })
    }
}
