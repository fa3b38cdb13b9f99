//! User work endpoints: dashboard status, draft, start, save, submit, PDFs.

use async_trait::async_trait;
use reqwest::Method;
use time::OffsetDateTime;
use tracing::info;

use super::types::{
    Ack, ContentBody, DashboardResponse, DraftResponse, Pdf, PdfsResponse, SaveDraftResponse, StartWorkRequest,
    WorkRecord,
};
use super::{ApiClient, send_bytes, send_json};
use crate::access::Resource;
use crate::autosave::DraftStore;
use crate::error::ClientError;
use crate::submission::{SubmitReceipt, SubmitSink};
use crate::workspace::{RemoteStatus, StatusSource};

impl ApiClient {
    /// `GET /api/users/dashboard`.
    ///
    /// # Errors
    ///
    /// Missing user session, or the server's rejection.
    pub async fn dashboard(&self) -> Result<DashboardResponse, ClientError> {
        send_json(self.authorized(Method::GET, "/api/users/dashboard", Resource::Dashboard)?).await
    }

    /// Saved draft, if the user has one.
    ///
    /// # Errors
    ///
    /// Missing user session, or the server's rejection.
    pub async fn draft(&self) -> Result<Option<WorkRecord>, ClientError> {
        let response: DraftResponse = send_json(self.authorized(Method::GET, "/api/work/draft", Resource::WorkEditor)?).await?;
        Ok(response.work)
    }

    /// Start the work clock. The server notifies admins.
    ///
    /// # Errors
    ///
    /// Blank fields, missing session, or the server's rejection (for
    /// example when work was already started).
    pub async fn start_work(&self, request: &StartWorkRequest) -> Result<Ack, ClientError> {
        request.validate()?;
        let ack = send_json(self.authorized(Method::POST, "/api/work/start", Resource::Dashboard)?.json(request)).await?;
        info!(project_link = %request.project_link, "work started");
        Ok(ack)
    }

    /// # Errors
    ///
    /// Missing session, the server's rejection, or a response without
    /// `lastSaved`.
    pub async fn save_draft(&self, content: &str) -> Result<OffsetDateTime, ClientError> {
        let request = self.authorized(Method::POST, "/api/work/save-draft", Resource::WorkEditor)?;
        let response: SaveDraftResponse = send_json(request.json(&ContentBody { content })).await?;
        response.last_saved()
    }

    /// # Errors
    ///
    /// Missing session or the server's rejection (deadline passed, already
    /// submitted, penalized).
    pub async fn submit_work(&self, content: &str) -> Result<SubmitReceipt, ClientError> {
        let request = self.authorized(Method::POST, "/api/work/submit", Resource::WorkEditor)?;
        send_json(request.json(&ContentBody { content })).await
    }

    /// Reference PDFs available to the user.
    ///
    /// # Errors
    ///
    /// Missing session or the server's rejection.
    pub async fn work_pdfs(&self) -> Result<Vec<Pdf>, ClientError> {
        let response: PdfsResponse = send_json(self.authorized(Method::GET, "/api/work/pdfs", Resource::WorkEditor)?).await?;
        Ok(response.pdfs)
    }

    /// Raw bytes of one reference PDF.
    ///
    /// # Errors
    ///
    /// Missing session or the server's rejection.
    pub async fn download_pdf(&self, pdf_id: &str) -> Result<Vec<u8>, ClientError> {
        let path = format!("/api/work/pdfs/{pdf_id}/download");
        send_bytes(self.authorized(Method::GET, &path, Resource::WorkEditor)?).await
    }
}

#[async_trait]
impl DraftStore for ApiClient {
    async fn save_draft(&self, content: &str) -> Result<OffsetDateTime, ClientError> {
        ApiClient::save_draft(self, content).await
    }
}

#[async_trait]
impl SubmitSink for ApiClient {
    async fn submit_work(&self, content: &str) -> Result<SubmitReceipt, ClientError> {
        ApiClient::submit_work(self, content).await
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch_status(&self) -> Result<RemoteStatus, ClientError> {
        Ok(RemoteStatus::from(self.dashboard().await?))
    }

    async fn load_draft(&self) -> Result<String, ClientError> {
        Ok(self.draft().await?.map(|work| work.content).unwrap_or_default())
    }
}
