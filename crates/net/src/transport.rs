//! Session transport for the 2Park JSON API
//!
//! Owns the credentials and the single live session cookie per account.
//! Every call is a form-encoded POST carrying `locale=nl_NL` (the version
//! check is the one GET); structured payloads are JSON-encoded into a
//! single `data` form field. On an authentication failure the held cookie
//! is discarded, the login exchange re-run, and the original call retried
//! exactly once. Concurrent failures share one login exchange.

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::Value as Json;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{endpoints, Envelope, MINOR_NOT_AUTHENTICATED};

/// Production base URL of the upstream service.
pub const DEFAULT_BASE_URL: &str = "https://mijn.2park.nl/gsmpark-app-www/json/";

const LOCALE: &str = "nl_NL";

/// Account credentials, re-used transparently on re-authentication.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// The one live session per account. The generation counter lets a task
/// that observed an auth failure tell whether another task already
/// refreshed the session while it waited for the lock.
#[derive(Debug, Default)]
struct SessionState {
    cookie: Option<String>,
    generation: u64,
}

enum CallOutcome {
    Ok(Json),
    AuthRejected,
}

/// Executes single upstream calls with session affinity.
pub struct SessionTransport {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    session: Mutex<SessionState>,
}

impl SessionTransport {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: Credentials, base_url: &str) -> Result<Self> {
        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&base_url)?,
            credentials,
            session: Mutex::new(SessionState::default()),
        })
    }

    /// Execute a form-encoded POST and return the envelope's `data` payload.
    ///
    /// Handles session establishment and the single re-auth retry; a second
    /// rejection surfaces as `Error::Auth`.
    pub async fn call(
        &self,
        endpoint: &str,
        fields: &[(&str, &str)],
        data: Option<&Json>,
    ) -> Result<Json> {
        let (mut cookie, generation) = self.session_snapshot().await;
        if cookie.is_none() {
            self.reauthenticate(generation).await?;
            (cookie, _) = self.session_snapshot().await;
        }

        match self.call_once(endpoint, fields, data, cookie.as_deref()).await? {
            CallOutcome::Ok(payload) => Ok(payload),
            CallOutcome::AuthRejected => {
                warn!(endpoint, "session rejected, re-authenticating");
                self.reauthenticate(generation).await?;
                let (cookie, _) = self.session_snapshot().await;
                match self.call_once(endpoint, fields, data, cookie.as_deref()).await? {
                    CallOutcome::Ok(payload) => Ok(payload),
                    CallOutcome::AuthRejected => Err(Error::Auth(
                        "session rejected after re-authentication".to_string(),
                    )),
                }
            }
        }
    }

    /// The one GET of the protocol: unauthenticated version check.
    pub async fn version(&self) -> Result<Json> {
        let url = self.endpoint_url(endpoints::VERSION)?;
        let response = self
            .http
            .get(url)
            .query(&[("locale", LOCALE)])
            .send()
            .await?;
        let envelope: Envelope = response.json().await?;
        if envelope.is_ok() {
            Ok(envelope.data.unwrap_or(Json::Null))
        } else {
            Err(envelope_error(&envelope))
        }
    }

    /// Run the login exchange now, replacing any held session.
    pub async fn authenticate(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        session.cookie = None;
        let cookie = self.login_exchange().await?;
        session.cookie = Some(cookie);
        session.generation += 1;
        Ok(())
    }

    async fn session_snapshot(&self) -> (Option<String>, u64) {
        let session = self.session.lock().await;
        (session.cookie.clone(), session.generation)
    }

    /// Re-run the login exchange unless another task already did so since
    /// `observed_generation`. Waiters queue on the session lock, so exactly
    /// one login happens per expiry no matter how many calls failed.
    async fn reauthenticate(&self, observed_generation: u64) -> Result<()> {
        let mut session = self.session.lock().await;
        if session.generation != observed_generation && session.cookie.is_some() {
            debug!("session already refreshed by a concurrent call");
            return Ok(());
        }
        session.cookie = None;
        let cookie = self.login_exchange().await?;
        session.cookie = Some(cookie);
        session.generation += 1;
        Ok(())
    }

    async fn login_exchange(&self) -> Result<String> {
        debug!(email = %self.credentials.email, "running login exchange");
        let url = self.endpoint_url(endpoints::LOGIN)?;
        let form = [
            ("email", self.credentials.email.as_str()),
            ("password", self.credentials.password.as_str()),
            ("locale", LOCALE),
        ];
        let response = self.http.post(url).form(&form).send().await?;
        let cookie = collect_cookies(response.headers());
        let envelope: Envelope = response.json().await?;
        if !envelope.is_ok() {
            return Err(Error::Auth(
                envelope.message().unwrap_or("invalid credentials").to_string(),
            ));
        }
        cookie.ok_or_else(|| Error::Auth("login issued no session cookie".to_string()))
    }

    async fn call_once(
        &self,
        endpoint: &str,
        fields: &[(&str, &str)],
        data: Option<&Json>,
        cookie: Option<&str>,
    ) -> Result<CallOutcome> {
        let url = self.endpoint_url(endpoint)?;

        let mut form: Vec<(&str, String)> = Vec::with_capacity(fields.len() + 2);
        form.push(("locale", LOCALE.to_string()));
        for (key, value) in fields {
            form.push((key, (*value).to_string()));
        }
        if let Some(data) = data {
            // Embedded structured payloads travel as one form field.
            form.push(("data", serde_json::to_string(data)?));
        }

        let mut request = self.http.post(url).form(&form);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie.to_string());
        }
        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(CallOutcome::AuthRejected);
        }
        let envelope: Envelope = response.json().await?;
        if envelope.is_ok() {
            return Ok(CallOutcome::Ok(envelope.data.unwrap_or(Json::Null)));
        }
        if envelope.minor() == Some(MINOR_NOT_AUTHENTICATED) {
            return Ok(CallOutcome::AuthRejected);
        }
        Err(envelope_error(&envelope))
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint)?)
    }
}

fn envelope_error(envelope: &Envelope) -> Error {
    Error::domain(
        envelope.minor().unwrap_or("UNKNOWN"),
        envelope.message().unwrap_or("unknown upstream error"),
    )
}

/// Collapse `Set-Cookie` headers into a single `Cookie` header value.
/// The token is opaque and HttpOnly; it is replayed, never parsed.
fn collect_cookies(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let cookies: Vec<&str> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter(|pair| !pair.is_empty())
        .collect();
    if cookies.is_empty() {
        None
    } else {
        Some(cookies.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderMap;

    #[test]
    fn cookies_collapse_to_replayable_pairs() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            "JSESSIONID=abc123; Path=/; HttpOnly".parse().unwrap(),
        );
        headers.append(SET_COOKIE, "lb=node2; Path=/".parse().unwrap());
        assert_eq!(
            collect_cookies(&headers).as_deref(),
            Some("JSESSIONID=abc123; lb=node2")
        );
    }

    #[test]
    fn no_cookies_yields_none() {
        assert_eq!(collect_cookies(&HeaderMap::new()), None);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let transport = SessionTransport::with_base_url(
            Credentials::new("a@b.nl", "pw"),
            "http://localhost:9999/api",
        )
        .unwrap();
        let url = transport.endpoint_url("version.json").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9999/api/version.json");
    }
}
