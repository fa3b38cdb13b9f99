//! Single-writer token for a session's content.
//!
//! DESIGN
//! ======
//! Draft saves and the final submit both write the same document. Each
//! write holds the token for the whole request. Submit seals it on success,
//! after which every later acquire fails with `AlreadySubmitted`, so no
//! draft save can land after (or race) the submission. A save already in
//! flight when submit starts finishes first because submit waits for the
//! token.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::ClientError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WriterState {
    Open,
    Sealed,
}

#[derive(Clone, Debug)]
pub struct WriteToken {
    inner: Arc<Mutex<WriterState>>,
}

impl Default for WriteToken {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteToken {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(WriterState::Open)) }
    }

    /// Token for a session that is already submitted.
    #[must_use]
    pub fn sealed() -> Self {
        Self { inner: Arc::new(Mutex::new(WriterState::Sealed)) }
    }

    /// Wait for exclusive write access.
    ///
    /// # Errors
    ///
    /// [`ClientError::AlreadySubmitted`] once the token has been sealed.
    pub async fn acquire(&self) -> Result<WriteGuard, ClientError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        if *guard == WriterState::Sealed {
            return Err(ClientError::AlreadySubmitted);
        }
        Ok(WriteGuard { guard })
    }

    pub async fn is_sealed(&self) -> bool {
        *self.inner.lock().await == WriterState::Sealed
    }
}

/// Exclusive write access; released on drop.
#[derive(Debug)]
pub struct WriteGuard {
    guard: OwnedMutexGuard<WriterState>,
}

impl WriteGuard {
    /// Close the token for good. Consumes the guard.
    pub fn seal(mut self) {
        *self.guard = WriterState::Sealed;
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;
