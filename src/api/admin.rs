//! `/api/admin` endpoints.
//!
//! Each call is gated on the admin capability for the view that owns it;
//! a user session fails locally with `Forbidden` before any request.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::info;

use super::types::{
    Ack, AdminWorkResponse, Agreement, AgreementsResponse, ContentBody, DashboardStats, DetailedUser, NewUser,
    PasswordResponse, Pdf, PdfsResponse, PenalizeRequest, SaveDraftResponse, SignedAgreement,
    SignedAgreementResponse, SignedAgreementsResponse, StartWorkRequest, StatsResponse, TogglePdfRequest, UserUpdate,
    UsersResponse, parse_detailed_users,
};
use super::{ApiClient, send_json};
use crate::access::Resource;
use crate::autosave::DraftStore;
use crate::error::ClientError;
use crate::search::{SearchResults, SearchScope, UniversalSearchResponse};
use crate::site_config::{SiteConfig, SiteConfigResponse};

/// Maximum accepted upload size for reference PDFs.
pub const MAX_PDF_BYTES: u64 = 10 * 1024 * 1024;

impl ApiClient {
    // -------------------------------------------------------------------------
    // Dashboard
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn admin_stats(&self) -> Result<DashboardStats, ClientError> {
        let request = self.authorized(Method::GET, "/api/admin/dashboard-stats", Resource::AdminDashboard)?;
        let response: StatsResponse = send_json(request).await?;
        Ok(response.stats)
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn detailed_user_data(&self) -> Result<Vec<DetailedUser>, ClientError> {
        let request = self.authorized(Method::GET, "/api/admin/detailed-user-data", Resource::AdminDashboard)?;
        parse_detailed_users(send_json::<Value>(request).await?)
    }

    /// Run the server's deadline/penalty automation now.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn trigger_automation(&self) -> Result<Ack, ClientError> {
        let request = self.authorized(Method::POST, "/api/admin/trigger-automation", Resource::AdminDashboard)?;
        let ack = send_json(request.json(&serde_json::json!({}))).await?;
        info!("automation triggered");
        Ok(ack)
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn list_users(&self) -> Result<Vec<crate::api::types::AccountUser>, ClientError> {
        let response: UsersResponse = send_json(self.authorized(Method::GET, "/api/admin/users", Resource::UserManagement)?).await?;
        Ok(response.users)
    }

    /// Create an account. The server emails an OTP.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn create_user(&self, user: &NewUser) -> Result<Ack, ClientError> {
        let request = self.authorized(Method::POST, "/api/admin/users", Resource::UserManagement)?;
        let ack = send_json(request.json(user)).await?;
        info!(email = %user.email, role = %user.role, "user created");
        Ok(ack)
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for an empty update, missing admin
    /// session, or the server's rejection.
    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<Ack, ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("Nothing to update".to_owned()));
        }
        let path = format!("/api/admin/users/{user_id}");
        send_json(self.authorized(Method::PUT, &path, Resource::UserManagement)?.json(update)).await
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn delete_user(&self, user_id: &str) -> Result<Ack, ClientError> {
        let path = format!("/api/admin/users/{user_id}");
        let ack = send_json(self.authorized(Method::DELETE, &path, Resource::UserManagement)?).await?;
        info!(user = %user_id, "user deleted");
        Ok(ack)
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn send_otp(&self, user_id: &str) -> Result<Ack, ClientError> {
        self.user_action(user_id, "send-otp").await
    }

    /// Email the agreement link (and an OTP) to the user.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn send_agreement(&self, user_id: &str) -> Result<Ack, ClientError> {
        self.user_action(user_id, "send-agreement").await
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn user_password(&self, user_id: &str) -> Result<String, ClientError> {
        let path = format!("/api/admin/users/{user_id}/password");
        let response: PasswordResponse = send_json(self.authorized(Method::GET, &path, Resource::UserManagement)?).await?;
        Ok(response.password)
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for an empty reason, missing admin
    /// session, or the server's rejection.
    pub async fn penalize(&self, user_id: &str, reason: &str) -> Result<Ack, ClientError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ClientError::Validation("A penalty reason is required".to_owned()));
        }
        let path = format!("/api/admin/users/{user_id}/penalize");
        let request = self.authorized(Method::POST, &path, Resource::UserManagement)?;
        let ack = send_json(request.json(&PenalizeRequest { reason })).await?;
        info!(user = %user_id, %reason, "user penalized");
        Ok(ack)
    }

    /// Clear the penalty flag. The user's deadline is not restarted.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn remove_penalty(&self, user_id: &str) -> Result<Ack, ClientError> {
        let ack = self.user_action(user_id, "remove-penalty").await?;
        info!(user = %user_id, "penalty removed");
        Ok(ack)
    }

    async fn user_action(&self, user_id: &str, action: &str) -> Result<Ack, ClientError> {
        let path = format!("/api/admin/users/{user_id}/{action}");
        let request = self.authorized(Method::POST, &path, Resource::UserManagement)?;
        send_json(request.json(&serde_json::json!({}))).await
    }

    // -------------------------------------------------------------------------
    // User work (admin view)
    // -------------------------------------------------------------------------

    /// Read-only view of a user's work.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn user_work(&self, user_id: &str) -> Result<AdminWorkResponse, ClientError> {
        let path = format!("/api/admin/users/{user_id}/work");
        send_json(self.authorized(Method::GET, &path, Resource::AdminDashboard)?).await
    }

    /// User and work for the admin editor.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn user_work_for_edit(&self, user_id: &str) -> Result<AdminWorkResponse, ClientError> {
        let path = format!("/api/admin/users/{user_id}/work-edit");
        send_json(self.authorized(Method::GET, &path, Resource::AdminWorkEditor)?).await
    }

    /// # Errors
    ///
    /// Missing admin session, the server's rejection, or a response without
    /// `lastSaved`.
    pub async fn save_user_work(&self, user_id: &str, content: &str) -> Result<OffsetDateTime, ClientError> {
        let path = format!("/api/admin/users/{user_id}/work-save");
        let request = self.authorized(Method::POST, &path, Resource::AdminWorkEditor)?;
        let response: SaveDraftResponse = send_json(request.json(&ContentBody { content })).await?;
        response.last_saved()
    }

    /// Start work on behalf of a user.
    ///
    /// # Errors
    ///
    /// Blank fields, missing admin session, or the server's rejection.
    pub async fn start_user_work(&self, user_id: &str, request: &StartWorkRequest) -> Result<Ack, ClientError> {
        request.validate()?;
        let path = format!("/api/admin/users/{user_id}/start-work");
        let ack = send_json(self.authorized(Method::POST, &path, Resource::AdminWorkEditor)?.json(request)).await?;
        info!(user = %user_id, "work started on behalf of user");
        Ok(ack)
    }

    // -------------------------------------------------------------------------
    // Agreements
    // -------------------------------------------------------------------------

    /// All agreement versions, newest first.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn agreements(&self) -> Result<Vec<Agreement>, ClientError> {
        let request = self.authorized(Method::GET, "/api/admin/agreements", Resource::AgreementManagement)?;
        let response: AgreementsResponse = send_json(request).await?;
        Ok(response.agreements)
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for blank content, missing admin
    /// session, or the server's rejection.
    pub async fn create_agreement(&self, content: &str) -> Result<Ack, ClientError> {
        require_agreement_text(content)?;
        let request = self.authorized(Method::POST, "/api/admin/agreements", Resource::AgreementManagement)?;
        send_json(request.json(&ContentBody { content })).await
    }

    /// # Errors
    ///
    /// [`ClientError::Validation`] for blank content, missing admin
    /// session, or the server's rejection.
    pub async fn update_agreement(&self, agreement_id: &str, content: &str) -> Result<Ack, ClientError> {
        require_agreement_text(content)?;
        let path = format!("/api/admin/agreements/{agreement_id}");
        let request = self.authorized(Method::PUT, &path, Resource::AgreementManagement)?;
        send_json(request.json(&ContentBody { content })).await
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn delete_agreement(&self, agreement_id: &str) -> Result<Ack, ClientError> {
        let path = format!("/api/admin/agreements/{agreement_id}");
        send_json(self.authorized(Method::DELETE, &path, Resource::AgreementManagement)?).await
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn signed_agreements(&self) -> Result<Vec<SignedAgreement>, ClientError> {
        let request = self.authorized(Method::GET, "/api/admin/signed-agreements", Resource::SignedAgreements)?;
        let response: SignedAgreementsResponse = send_json(request).await?;
        Ok(response.signed_agreements)
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn signed_agreement(&self, id: &str) -> Result<SignedAgreement, ClientError> {
        let path = format!("/api/admin/signed-agreements/{id}");
        let response: SignedAgreementResponse =
            send_json(self.authorized(Method::GET, &path, Resource::SignedAgreements)?).await?;
        Ok(response.signed_agreement)
    }

    /// Email the signed agreement PDF to its signer.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn send_signed_agreement_pdf(&self, id: &str) -> Result<Ack, ClientError> {
        let path = format!("/api/admin/signed-agreements/{id}/send-pdf");
        let request = self.authorized(Method::POST, &path, Resource::SignedAgreements)?;
        send_json(request.json(&serde_json::json!({}))).await
    }

    // -------------------------------------------------------------------------
    // PDFs
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn admin_pdfs(&self) -> Result<Vec<Pdf>, ClientError> {
        let response: PdfsResponse = send_json(self.authorized(Method::GET, "/api/admin/pdfs", Resource::PdfManagement)?).await?;
        Ok(response.pdfs)
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn active_pdfs(&self) -> Result<Vec<Pdf>, ClientError> {
        let request = self.authorized(Method::GET, "/api/admin/pdfs/active", Resource::AdminWorkEditor)?;
        let response: PdfsResponse = send_json(request).await?;
        Ok(response.pdfs)
    }

    /// Upload a reference PDF from disk.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a missing title, a non-PDF file, or
    /// an oversized file; I/O errors reading it; missing admin session; or
    /// the server's rejection.
    pub async fn upload_pdf(&self, file: &Path, title: &str, description: &str) -> Result<Ack, ClientError> {
        if title.trim().is_empty() {
            return Err(ClientError::Validation("Please provide a title".to_owned()));
        }
        let is_pdf = file.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(ClientError::Validation("Only PDF files are allowed".to_owned()));
        }
        let bytes = tokio::fs::read(file).await?;
        if bytes.len() as u64 > MAX_PDF_BYTES {
            return Err(ClientError::Validation("File size must be less than 10MB".to_owned()));
        }

        let file_name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "upload.pdf".to_owned());
        let part = Part::bytes(bytes).file_name(file_name).mime_str("application/pdf")?;
        let form = Form::new()
            .part("pdf", part)
            .text("title", title.trim().to_owned())
            .text("description", description.to_owned());

        let request = self.authorized(Method::POST, "/api/admin/pdfs/upload", Resource::PdfManagement)?;
        let ack = send_json(request.multipart(form)).await?;
        info!(%title, "pdf uploaded");
        Ok(ack)
    }

    /// Flip a PDF between active and inactive; `currently_active` is the
    /// state being replaced.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn toggle_pdf(&self, pdf_id: &str, currently_active: bool) -> Result<Ack, ClientError> {
        let path = format!("/api/admin/pdfs/{pdf_id}/toggle");
        let request = self.authorized(Method::PATCH, &path, Resource::PdfManagement)?;
        send_json(request.json(&TogglePdfRequest { is_active: !currently_active })).await
    }

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn delete_pdf(&self, pdf_id: &str) -> Result<Ack, ClientError> {
        let path = format!("/api/admin/pdfs/{pdf_id}");
        send_json(self.authorized(Method::DELETE, &path, Resource::PdfManagement)?).await
    }

    // -------------------------------------------------------------------------
    // Site config and search
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn admin_site_config(&self) -> Result<SiteConfig, ClientError> {
        let request = self.authorized(Method::GET, "/api/admin/site-config", Resource::SiteConfig)?;
        let response: SiteConfigResponse = send_json(request).await?;
        Ok(response.config)
    }

    /// # Errors
    ///
    /// Local validation failures, missing admin session, or the server's
    /// rejection.
    pub async fn update_site_config(&self, config: &SiteConfig) -> Result<SiteConfig, ClientError> {
        config.validate()?;
        let request = self.authorized(Method::PUT, "/api/admin/site-config", Resource::SiteConfig)?;
        let response: SiteConfigResponse = send_json(request.json(config)).await?;
        info!(navbar_title = %response.config.navbar_title, "site config updated");
        Ok(response.config)
    }

    /// Search users, signed agreements, PDFs and work in one call.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn universal_search(&self, query: &str, scope: SearchScope) -> Result<SearchResults, ClientError> {
        let request = self
            .authorized(Method::GET, "/api/admin/universal-search", Resource::AdminDashboard)?
            .query(&[("q", query), ("type", scope.as_param())]);
        let response: UniversalSearchResponse = send_json(request).await?;
        Ok(response.results)
    }

    /// Quick user lookup by name, email or mobile.
    ///
    /// # Errors
    ///
    /// Missing admin session or the server's rejection.
    pub async fn search_users(&self, query: &str) -> Result<Vec<crate::api::types::AccountUser>, ClientError> {
        let request = self
            .authorized(Method::GET, "/api/admin/search-users", Resource::AdminDashboard)?
            .query(&[("q", query)]);
        let response: UsersResponse = send_json(request).await?;
        Ok(response.users)
    }
}

fn require_agreement_text(content: &str) -> Result<(), ClientError> {
    if content.trim().is_empty() {
        return Err(ClientError::Validation("Please enter agreement content".to_owned()));
    }
    Ok(())
}

/// Draft store that saves into another user's work through the admin API.
#[derive(Clone, Debug)]
pub struct AdminDraftStore {
    client: ApiClient,
    user_id: String,
}

impl AdminDraftStore {
    #[must_use]
    pub fn new(client: ApiClient, user_id: impl Into<String>) -> Self {
        Self { client, user_id: user_id.into() }
    }
}

#[async_trait]
impl DraftStore for AdminDraftStore {
    async fn save_draft(&self, content: &str) -> Result<OffsetDateTime, ClientError> {
        self.client.save_user_work(&self.user_id, content).await
    }
}
