//! Deadline countdown fed by server-reported time remaining.
//!
//! The countdown never derives remaining time from the local clock. Each
//! poll hands it the server's `timeRemaining`; the countdown keeps the value
//! monotonically non-increasing between polls so clock skew or a stale
//! response cannot make the timer jump backwards. A new `started_at` (the
//! session epoch) resets it.

use std::time::Duration;

use time::OffsetDateTime;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

pub const EXPIRED_LABEL: &str = "Time expired";

/// Render remaining time as `"{d}d {h}h {m}m"`, or [`EXPIRED_LABEL`].
#[must_use]
pub fn format_remaining(remaining: Option<Duration>) -> String {
    let Some(remaining) = remaining.filter(|d| !d.is_zero()) else {
        return EXPIRED_LABEL.to_owned();
    };
    let secs = remaining.as_secs();
    let days = secs / SECS_PER_DAY;
    let hours = (secs % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    format!("{days}d {hours}h {minutes}m")
}

/// Whole days left, rounded up the way the dashboard counts them.
#[must_use]
pub fn days_left_from(remaining: Duration) -> u64 {
    remaining.as_secs().div_ceil(SECS_PER_DAY)
}

#[must_use]
pub fn days_left_label(days: u64) -> String {
    if days == 1 { "1 day".to_owned() } else { format!("{days} days") }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: Option<Duration>,
    epoch: Option<OffsetDateTime>,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one poll result and return the value to display.
    ///
    /// `epoch` is the session's `started_at`; when it differs from the last
    /// observed epoch the countdown starts over from `reported`.
    pub fn observe(&mut self, reported: Duration, epoch: Option<OffsetDateTime>) -> Duration {
        let next = match self.remaining {
            Some(previous) if self.epoch == epoch => previous.min(reported),
            _ => reported,
        };
        self.remaining = Some(next);
        self.epoch = epoch;
        next
    }

    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining.is_some_and(|d| d.is_zero())
    }

    #[must_use]
    pub fn formatted(&self) -> String {
        format_remaining(self.remaining)
    }

    pub fn reset(&mut self) {
        self.remaining = None;
        self.epoch = None;
    }
}

#[cfg(test)]
#[path = "countdown_test.rs"]
mod tests;
