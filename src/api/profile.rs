//! `/api/users/profile` and the public site configuration.

use reqwest::Method;
use tracing::info;

use super::types::{AccountUser, ProfileUpdate, UserResponse};
use super::{ApiClient, send_json};
use crate::access::Resource;
use crate::error::ClientError;
use crate::site_config::{SiteConfig, SiteConfigResponse};

impl ApiClient {
    /// # Errors
    ///
    /// Missing user session, or the server's rejection.
    pub async fn profile(&self) -> Result<AccountUser, ClientError> {
        let response: UserResponse = send_json(self.authorized(Method::GET, "/api/users/profile", Resource::Profile)?).await?;
        Ok(response.user)
    }

    /// # Errors
    ///
    /// Local validation failures, missing session, or the server's
    /// rejection.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ClientError> {
        update.validate()?;
        let request = self.authorized(Method::PUT, "/api/users/profile", Resource::Profile)?;
        let _: serde_json::Value = send_json(request.json(update)).await?;
        info!(name = %update.name, "profile updated");
        Ok(())
    }

    /// Public branding shown on the landing page. No session needed.
    ///
    /// # Errors
    ///
    /// Transport failures or the server's rejection.
    pub async fn site_config(&self) -> Result<SiteConfig, ClientError> {
        let response: SiteConfigResponse = send_json(self.request(Method::GET, "/api/site-config")?).await?;
        Ok(response.config)
    }
}
