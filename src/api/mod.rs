//! REST client for the platform API.
//!
//! DESIGN
//! ======
//! `ApiClient` wraps one `reqwest::Client` (shared connection pool, fixed
//! timeouts) plus the explicit `AuthSession`. Endpoint groups live in
//! sibling modules as `impl ApiClient` blocks. Every protected call checks
//! the session's capability for the matching [`Resource`] before building
//! the request, so a user session never sends an admin request.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `ClientError::Rejected` carrying the server's
//! `message`. Nothing is retried.

pub mod admin;
pub mod auth;
pub mod profile;
pub mod types;
pub mod work;

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::access::{Resource, require};
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<AuthSession>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.base_url).field("session", &self.session).finish()
    }
}

impl ApiClient {
    /// Build a client with the configured timeouts and no session.
    ///
    /// # Errors
    ///
    /// [`ClientError::Http`] if the TLS backend fails to initialise.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()?;
        Ok(Self { http, base_url: config.api_url.clone(), session: None })
    }

    #[must_use]
    pub fn with_session(mut self, session: Option<AuthSession>) -> Self {
        self.session = session;
        self
    }

    pub fn set_session(&mut self, session: Option<AuthSession>) {
        self.session = session;
    }

    #[must_use]
    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request with the session's bearer token attached when one exists.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let request = self.http.request(method, self.url(path));
        match &self.session {
            Some(session) => bearer(request, &session.token),
            None => Ok(request),
        }
    }

    /// Request for a protected resource. Fails locally without a matching
    /// session.
    fn authorized(&self, method: Method, path: &str, resource: Resource) -> Result<RequestBuilder, ClientError> {
        require(self.session.as_ref(), resource)?;
        self.request(method, path)
    }
}

async fn send_json<T>(request: RequestBuilder) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let response = checked(request).await?;
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Object(Map::new()))?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

async fn send_bytes(request: RequestBuilder) -> Result<Vec<u8>, ClientError> {
    let response = checked(request).await?;
    Ok(response.bytes().await?.to_vec())
}

fn bearer(request: RequestBuilder, token: &str) -> Result<RequestBuilder, ClientError> {
    let value = HeaderValue::from_str(&format!("Bearer {token}"))?;
    Ok(request.header(AUTHORIZATION, value))
}

async fn checked(request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();
    debug!(url = %response.url().path(), status = status.as_u16(), "api response");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    Err(ClientError::rejected(status.as_u16(), &body))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
