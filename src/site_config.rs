//! Site branding shown on the landing page and footer.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::ApiClient;
use crate::error::ClientError;

pub const DEFAULT_NAVBAR_TITLE: &str = "DataEntry Pro";
pub const DEFAULT_CONTACT_NUMBER: &str = "+1 (555) 123-4567";
pub const DEFAULT_ADDRESS: &str = "123 Business Street, City, State 12345";
pub const DEFAULT_EMAIL: &str = "bforboll81@gmail.com";

/// Missing fields fall back to the built-in defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    pub navbar_title: String,
    pub footer_contact_number: String,
    pub footer_address: String,
    pub footer_email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            navbar_title: DEFAULT_NAVBAR_TITLE.to_owned(),
            footer_contact_number: DEFAULT_CONTACT_NUMBER.to_owned(),
            footer_address: DEFAULT_ADDRESS.to_owned(),
            footer_email: DEFAULT_EMAIL.to_owned(),
        }
    }
}

impl SiteConfig {
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank field or an email without
    /// `@`.
    pub fn validate(&self) -> Result<(), ClientError> {
        let fields = [
            ("Navbar title", &self.navbar_title),
            ("Contact number", &self.footer_contact_number),
            ("Address", &self.footer_address),
            ("Email", &self.footer_email),
        ];
        if let Some((label, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ClientError::Validation(format!("{label} is required")));
        }
        if !self.footer_email.contains('@') {
            return Err(ClientError::Validation("Please enter a valid email".to_owned()));
        }
        Ok(())
    }

    /// Copy of `self` with the fields set in `patch` replaced.
    #[must_use]
    pub fn patched(&self, patch: &SiteConfigPatch) -> Self {
        let pick = |new: &Option<String>, old: &String| new.clone().unwrap_or_else(|| old.clone());
        Self {
            navbar_title: pick(&patch.navbar_title, &self.navbar_title),
            footer_contact_number: pick(&patch.footer_contact_number, &self.footer_contact_number),
            footer_address: pick(&patch.footer_address, &self.footer_address),
            footer_email: pick(&patch.footer_email, &self.footer_email),
        }
    }
}

/// Partial edit of a [`SiteConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteConfigPatch {
    pub navbar_title: Option<String>,
    pub footer_contact_number: Option<String>,
    pub footer_address: Option<String>,
    pub footer_email: Option<String>,
}

impl SiteConfigPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.navbar_title.is_none()
            && self.footer_contact_number.is_none()
            && self.footer_address.is_none()
            && self.footer_email.is_none()
    }
}

/// `{ config }` wrapper used by both the public and admin endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SiteConfigResponse {
    #[serde(default)]
    pub config: SiteConfig,
}

/// Fetch the public config, keeping the defaults when the server is
/// unreachable.
pub async fn load_or_default(client: &ApiClient) -> SiteConfig {
    match client.site_config().await {
        Ok(config) => config,
        Err(error) => {
            warn!(%error, "site config unavailable; using defaults");
            SiteConfig::default()
        }
    }
}

#[cfg(test)]
#[path = "site_config_test.rs"]
mod tests;
