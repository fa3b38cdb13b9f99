//! Client error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Every failure a view can hit funnels into `ClientError`. The CLI (and any
//! other front end) treats them uniformly: extract a human-readable message
//! with [`ClientError::user_message`] and show it. REST calls are never
//! retried automatically; only the notification stream reconnects.

use serde_json::Value;

use crate::access::Resource;
use crate::auth::Role;

/// Broad category of a [`ClientError`], used for exit codes and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, HTTP, or websocket failure.
    Transport,
    /// Input rejected before any request was made.
    Validation,
    /// Missing session or role mismatch.
    Authorization,
    /// The server or the local session model refused the operation.
    BusinessRule,
    /// Local I/O or serialization failure.
    Local,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not logged in; run `workdesk login` first")]
    NotAuthenticated,
    #[error("{role} session cannot access {resource}")]
    Forbidden { role: Role, resource: Resource },
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("server rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("please add some content before submitting")]
    EmptyContent,
    #[error("work is read-only")]
    ReadOnly,
    #[error("work has not been started")]
    NotStarted,
    #[error("work has already been started")]
    AlreadyStarted,
    #[error("work has already been submitted")]
    AlreadySubmitted,
    #[error("work is penalized and cannot be submitted")]
    Penalized,
    #[error("a submission is already in progress")]
    SubmitInProgress,
    #[error("cancelled")]
    Cancelled,
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsConnect(Box::new(error))
    }
}

impl ClientError {
    /// Build a [`ClientError::Rejected`] from a non-success response body.
    #[must_use]
    pub fn rejected(status: u16, body: &Value) -> Self {
        let message = message_from_body(body).unwrap_or_else(|| default_message(status).to_owned());
        Self::Rejected { status, message }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::WsConnect(_) | Self::WsClosed => ErrorKind::Transport,
            Self::Validation(_) | Self::EmptyContent | Self::InvalidBaseUrl(_) => ErrorKind::Validation,
            Self::NotAuthenticated | Self::Forbidden { .. } => ErrorKind::Authorization,
            Self::Rejected { status, .. } if *status == 401 || *status == 403 => ErrorKind::Authorization,
            Self::Rejected { .. }
            | Self::ReadOnly
            | Self::NotStarted
            | Self::AlreadyStarted
            | Self::AlreadySubmitted
            | Self::Penalized
            | Self::SubmitInProgress
            | Self::Cancelled => ErrorKind::BusinessRule,
            Self::InvalidHeader(_) | Self::MissingField(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Local,
        }
    }

    /// Message suitable for showing to the person at the keyboard.
    ///
    /// Server rejections surface the server's own `message`; everything else
    /// uses the error's display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Http(e) if e.is_timeout() => "the server took too long to respond".to_owned(),
            Self::Http(e) if e.is_connect() => "could not reach the server".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error payload.
///
/// Accepts `{ "message": "..." }`, `{ "error": "..." }` and
/// `{ "error": { "message": "..." } }`.
#[must_use]
pub fn message_from_body(body: &Value) -> Option<String> {
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        return Some(message.to_owned());
    }
    match body.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str).map(ToOwned::to_owned),
        _ => None,
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "session expired or invalid; log in again",
        403 => "not allowed",
        404 => "not found",
        409 => "conflict",
        _ if status >= 500 => "server error",
        _ => "request failed",
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
