//! Raw per-user work session fields.

use time::{Duration, OffsetDateTime};

use crate::error::ClientError;

use super::status::{WorkStatus, resolve};

/// Time a user has from starting work to submitting it.
pub const WORK_WINDOW: Duration = Duration::hours(96);
/// Informational review period after submission.
pub const REVIEW_WINDOW: Duration = Duration::hours(24);

/// One user's work session.
///
/// `started_at` and `submitted_at` are write-once through [`WorkSession::start`]
/// and [`WorkSession::submit`]. The `with_*` builders restore server state as
/// reported and do not re-check invariants: the server is authoritative.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkSession {
    started_at: Option<OffsetDateTime>,
    submitted_at: Option<OffsetDateTime>,
    is_penalized: bool,
    penalized_reason: Option<String>,
    content: String,
    last_saved: Option<OffsetDateTime>,
}

impl WorkSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session whose clock started at `at`.
    #[must_use]
    pub fn started(at: OffsetDateTime) -> Self {
        Self { started_at: Some(at), ..Self::default() }
    }

    #[must_use]
    pub fn with_started_at(mut self, at: Option<OffsetDateTime>) -> Self {
        self.started_at = at;
        self
    }

    #[must_use]
    pub fn with_submitted_at(mut self, at: Option<OffsetDateTime>) -> Self {
        self.submitted_at = at;
        self
    }

    #[must_use]
    pub fn with_penalty(mut self, is_penalized: bool, reason: Option<String>) -> Self {
        self.is_penalized = is_penalized;
        self.penalized_reason = if is_penalized { reason } else { None };
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    #[must_use]
    pub fn with_last_saved(mut self, at: Option<OffsetDateTime>) -> Self {
        self.last_saved = at;
        self
    }

    #[must_use]
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<OffsetDateTime> {
        self.submitted_at
    }

    #[must_use]
    pub fn is_penalized(&self) -> bool {
        self.is_penalized
    }

    #[must_use]
    pub fn penalized_reason(&self) -> Option<&str> {
        self.penalized_reason.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn last_saved(&self) -> Option<OffsetDateTime> {
        self.last_saved
    }

    /// `started_at + 96h`; fixed once the session starts.
    #[must_use]
    pub fn deadline(&self) -> Option<OffsetDateTime> {
        self.started_at.map(|at| at + WORK_WINDOW)
    }

    /// `submitted_at + 24h`, once submitted.
    #[must_use]
    pub fn review_deadline(&self) -> Option<OffsetDateTime> {
        self.submitted_at.map(|at| at + REVIEW_WINDOW)
    }

    /// Start the work clock.
    ///
    /// # Errors
    ///
    /// [`ClientError::AlreadyStarted`] if the clock is already running.
    pub fn start(&mut self, at: OffsetDateTime) -> Result<(), ClientError> {
        if self.started_at.is_some() {
            return Err(ClientError::AlreadyStarted);
        }
        self.started_at = Some(at);
        Ok(())
    }

    /// Mark the session submitted at `at`.
    ///
    /// # Errors
    ///
    /// Fails when the session was never started, is already submitted, or is
    /// penalized.
    pub fn submit(&mut self, at: OffsetDateTime) -> Result<(), ClientError> {
        if self.started_at.is_none() {
            return Err(ClientError::NotStarted);
        }
        if self.submitted_at.is_some() {
            return Err(ClientError::AlreadySubmitted);
        }
        if self.is_penalized {
            return Err(ClientError::Penalized);
        }
        self.submitted_at = Some(at);
        Ok(())
    }

    pub fn penalize(&mut self, reason: Option<String>) {
        self.is_penalized = true;
        self.penalized_reason = reason;
    }

    /// Clear the penalty flag. The deadline clock is left untouched.
    pub fn remove_penalty(&mut self) {
        self.is_penalized = false;
        self.penalized_reason = None;
    }

    /// Replace the document content.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotStarted`] before start, [`ClientError::ReadOnly`]
    /// once submitted, penalized, or past the deadline.
    pub fn edit(&mut self, content: impl Into<String>, now: OffsetDateTime) -> Result<(), ClientError> {
        match resolve(self, now).status {
            WorkStatus::InProgress => {
                self.content = content.into();
                Ok(())
            }
            WorkStatus::NotStarted => Err(ClientError::NotStarted),
            WorkStatus::Submitted | WorkStatus::Overdue | WorkStatus::Penalized => Err(ClientError::ReadOnly),
        }
    }

    pub fn record_save(&mut self, at: OffsetDateTime) {
        self.last_saved = Some(at);
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
