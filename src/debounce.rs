//! Trailing-edge debounce timer shared by auto-save and search.
//!
//! Holds only a due instant; the owning task decides what to do when it
//! fires. Uses `tokio::time::Instant` so paused-clock tests drive it.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Clone, Debug)]
pub struct Debounce {
    delay: Duration,
    due: Option<Instant>,
}

impl Debounce {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Re-arm the timer relative to now.
    pub fn touch(&mut self) -> Instant {
        self.touch_at(Instant::now())
    }

    /// Re-arm the timer relative to `now`.
    pub fn touch_at(&mut self, now: Instant) -> Instant {
        let due = now + self.delay;
        self.due = Some(due);
        due
    }

    #[must_use]
    pub fn due(&self) -> Option<Instant> {
        self.due
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.due.is_some_and(|due| now >= due)
    }

    /// Disarm and report whether the timer had fired by `now`.
    pub fn take_if_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.due = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.due = None;
    }
}

/// Sleep until `due`, or forever when disarmed. For use in `select!`.
pub async fn sleep_until_opt(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
#[path = "debounce_test.rs"]
mod tests;
