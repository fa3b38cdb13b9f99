//! Client configuration parsed from environment variables.
//!
//! `.env` files are honoured through `dotenvy` (loaded by the binary before
//! [`ClientConfig::from_env`] runs). CLI flags override individual fields.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_AUTOSAVE_SECS: u64 = 30;
pub const DEFAULT_POLL_SECS: u64 = 60;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
const SESSION_DIR: &str = ".workdesk";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("WORKDESK_API_URL must start with http:// or https://, got {0}")]
    InvalidApiUrl(String),
    #[error("{var} must be greater than zero")]
    ZeroInterval { var: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the platform API, without a trailing slash.
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Idle period after the last edit before a draft is auto-saved.
    pub autosave_interval: Duration,
    /// How often the deadline countdown re-polls the server.
    pub poll_interval: Duration,
    pub search_debounce: Duration,
    /// Where the CLI persists the login session.
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            autosave_interval: Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            session_file: default_session_file(std::env::var_os("HOME").map(PathBuf::from)),
        }
    }
}

impl ClientConfig {
    /// Build typed config from process environment variables.
    ///
    /// Optional:
    /// - `WORKDESK_API_URL`: default `http://localhost:5000`
    /// - `WORKDESK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `WORKDESK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `WORKDESK_AUTOSAVE_SECS`: default 30
    /// - `WORKDESK_POLL_SECS`: default 60
    /// - `WORKDESK_SEARCH_DEBOUNCE_MS`: default 300
    /// - `WORKDESK_SESSION_FILE`: default `$HOME/.workdesk/session.json`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-HTTP API URL or a zero interval.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reads variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("WORKDESK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_url = normalize_api_url(&api_url)?;

        let autosave_secs = parse_or(lookup("WORKDESK_AUTOSAVE_SECS"), DEFAULT_AUTOSAVE_SECS);
        if autosave_secs == 0 {
            return Err(ConfigError::ZeroInterval { var: "WORKDESK_AUTOSAVE_SECS" });
        }
        let poll_secs = parse_or(lookup("WORKDESK_POLL_SECS"), DEFAULT_POLL_SECS);
        if poll_secs == 0 {
            return Err(ConfigError::ZeroInterval { var: "WORKDESK_POLL_SECS" });
        }

        let session_file = lookup("WORKDESK_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_session_file(lookup("HOME").map(PathBuf::from)));

        Ok(Self {
            api_url,
            timeouts: Timeouts {
                request_secs: parse_or(lookup("WORKDESK_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: parse_or(lookup("WORKDESK_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            autosave_interval: Duration::from_secs(autosave_secs),
            poll_interval: Duration::from_secs(poll_secs),
            search_debounce: Duration::from_millis(parse_or(
                lookup("WORKDESK_SEARCH_DEBOUNCE_MS"),
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )),
            session_file,
        })
    }

    /// Replace the API URL, applying the same validation as `from_env`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] for non-HTTP URLs.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(api_url)?;
        Ok(self)
    }
}

pub(crate) fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_owned())
    } else {
        Err(ConfigError::InvalidApiUrl(raw.to_owned()))
    }
}

pub(crate) fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn default_session_file(home: Option<PathBuf>) -> PathBuf {
    home.unwrap_or_default().join(SESSION_DIR).join(SESSION_FILE)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
