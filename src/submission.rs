//! Submission gate: the one-way move from editable draft to submitted work.
//!
//! Checks run in a fixed order and all of them happen before any request:
//! editable, non-blank content, explicit confirmation, no other submit in
//! progress. The gate then takes the session's [`WriteToken`] (waiting for
//! an in-flight draft save to finish), sends the final content, and seals
//! the token on success. A rejected submit drops the token unsealed so the
//! user can retry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::editor::Document;
use crate::error::ClientError;
use crate::writer::WriteToken;

pub const CONFIRM_PROMPT: &str = "Are you sure you want to submit your work? This action cannot be undone.";

/// Server confirmation of a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub message: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub review_deadline: Option<OffsetDateTime>,
}

impl SubmitReceipt {
    /// Message plus the review deadline line, when the server sent one.
    #[must_use]
    pub fn summary(&self) -> String {
        let deadline = self
            .review_deadline
            .and_then(|at| at.format(&time::format_description::well_known::Rfc3339).ok());
        match deadline {
            Some(at) => format!("{}\n\nReview deadline: {at}", self.message),
            None => self.message.clone(),
        }
    }
}

/// Destination for the final submission.
#[async_trait]
pub trait SubmitSink: Send + Sync {
    async fn submit_work(&self, content: &str) -> Result<SubmitReceipt, ClientError>;
}

/// Asks the user to confirm an irreversible action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct SubmissionGate {
    sink: Arc<dyn SubmitSink>,
    token: WriteToken,
    submitting: AtomicBool,
}

impl SubmissionGate {
    #[must_use]
    pub fn new(sink: Arc<dyn SubmitSink>, token: WriteToken) -> Self {
        Self { sink, token, submitting: AtomicBool::new(false) }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Submit `content` as final.
    ///
    /// # Errors
    ///
    /// - [`ClientError::ReadOnly`] when the session is not editable
    /// - [`ClientError::EmptyContent`] for blank content
    /// - [`ClientError::Cancelled`] when the user declines
    /// - [`ClientError::SubmitInProgress`] while another submit runs
    /// - [`ClientError::AlreadySubmitted`] after a successful submit
    /// - the sink's error if the server rejects the submission
    pub async fn submit(&self, content: &str, editable: bool, confirm: &dyn Confirm) -> Result<SubmitReceipt, ClientError> {
        if !editable {
            return Err(ClientError::ReadOnly);
        }
        if Document::new(content).is_blank() {
            return Err(ClientError::EmptyContent);
        }
        if !confirm.confirm(CONFIRM_PROMPT) {
            return Err(ClientError::Cancelled);
        }
        if self.submitting.swap(true, Ordering::AcqRel) {
            return Err(ClientError::SubmitInProgress);
        }
        let _in_flight = InFlight(&self.submitting);

        let guard = self.token.acquire().await?;
        match self.sink.submit_work(content).await {
            Ok(receipt) => {
                guard.seal();
                info!(review_deadline = ?receipt.review_deadline, "work submitted");
                Ok(receipt)
            }
            Err(error) => {
                warn!(%error, "submission rejected");
                Err(error)
            }
        }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[path = "submission_test.rs"]
mod tests;
