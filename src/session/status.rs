//! Work status resolver.
//!
//! Maps the raw session fields (plus a clock reading) to exactly one of five
//! states. The server reports only four wire strings; a penalty applied
//! inside the work window is reported as `in_progress` plus the user's
//! penalty flag and resolves locally to [`WorkStatus::Penalized`].

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::model::WorkSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    NotStarted,
    InProgress,
    Submitted,
    Overdue,
    Penalized,
}

impl WorkStatus {
    /// Dashboard label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::InProgress => "In Progress",
            Self::Submitted => "Submitted",
            Self::Overdue => "Overdue",
            Self::Penalized => "Penalized",
        }
    }

    #[must_use]
    pub fn is_editable(self) -> bool {
        self == Self::InProgress
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Informational review sub-state of a submitted session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewState {
    /// Still inside the 24 hour review window.
    Pending,
    /// The review deadline has passed.
    Elapsed,
}

/// Resolved view of a session at one instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: WorkStatus,
    /// `max(0, deadline - now)`; zero when not in the work window.
    pub time_remaining: Duration,
    pub deadline: Option<OffsetDateTime>,
    pub review_deadline: Option<OffsetDateTime>,
    pub review: Option<ReviewState>,
}

impl StatusSnapshot {
    #[must_use]
    pub fn editable(&self) -> bool {
        self.status.is_editable()
    }

    /// Banner shown above a read-only editor, if the editor is read-only.
    #[must_use]
    pub fn read_only_reason(&self) -> Option<&'static str> {
        match self.status {
            WorkStatus::InProgress => None,
            WorkStatus::NotStarted => Some("Work has not been started."),
            WorkStatus::Submitted => Some("Work has been submitted."),
            WorkStatus::Overdue => Some("The deadline has passed."),
            WorkStatus::Penalized => Some("A penalty has been applied to this work."),
        }
    }

    /// Whether the review-deadline hint should be displayed.
    #[must_use]
    pub fn shows_review_hint(&self) -> bool {
        self.status == WorkStatus::Submitted && self.review_deadline.is_some()
    }

    /// Mark the snapshot submitted once the server has accepted the work.
    /// A server-supplied review deadline replaces the locally derived one.
    pub fn confirm_submitted(&mut self, review_deadline: Option<OffsetDateTime>, now: OffsetDateTime) {
        self.status = WorkStatus::Submitted;
        self.time_remaining = Duration::ZERO;
        if review_deadline.is_some() {
            self.review_deadline = review_deadline;
        }
        self.review = review_state(self.status, self.review_deadline, now);
    }

    /// Combine a server-reported status with locally known session fields.
    ///
    /// `time_remaining` is taken from the server as-is (clamped at zero) so
    /// the countdown never depends on the local clock.
    #[must_use]
    pub fn from_remote(reported: WorkStatus, time_remaining_ms: Option<i64>, session: &WorkSession, now: OffsetDateTime) -> Self {
        let status = match reported {
            WorkStatus::InProgress if session.is_penalized() => WorkStatus::Penalized,
            other => other,
        };
        let time_remaining = match status {
            WorkStatus::InProgress | WorkStatus::Penalized => {
                Duration::from_millis(u64::try_from(time_remaining_ms.unwrap_or(0)).unwrap_or(0))
            }
            _ => Duration::ZERO,
        };
        let review_deadline = session.review_deadline();
        Self {
            status,
            time_remaining,
            deadline: session.deadline(),
            review_deadline,
            review: review_state(status, review_deadline, now),
        }
    }
}

/// Resolve `session` at `now`.
#[must_use]
pub fn resolve(session: &WorkSession, now: OffsetDateTime) -> StatusSnapshot {
    let deadline = session.deadline();
    let review_deadline = session.review_deadline();

    let status = match (session.started_at(), session.submitted_at(), deadline) {
        (None, _, _) | (_, _, None) => WorkStatus::NotStarted,
        (Some(_), Some(_), _) => WorkStatus::Submitted,
        (Some(_), None, Some(deadline)) if now > deadline => WorkStatus::Overdue,
        (Some(_), None, Some(_)) if session.is_penalized() => WorkStatus::Penalized,
        (Some(_), None, Some(_)) => WorkStatus::InProgress,
    };

    let time_remaining = match (status, deadline) {
        (WorkStatus::InProgress | WorkStatus::Penalized, Some(deadline)) => remaining_until(deadline, now),
        _ => Duration::ZERO,
    };

    StatusSnapshot {
        status,
        time_remaining,
        deadline,
        review_deadline,
        review: review_state(status, review_deadline, now),
    }
}

fn review_state(status: WorkStatus, review_deadline: Option<OffsetDateTime>, now: OffsetDateTime) -> Option<ReviewState> {
    if status != WorkStatus::Submitted {
        return None;
    }
    review_deadline.map(|at| if now <= at { ReviewState::Pending } else { ReviewState::Elapsed })
}

fn remaining_until(deadline: OffsetDateTime, now: OffsetDateTime) -> Duration {
    Duration::try_from(deadline - now).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
