//! Auto-save coordinator.
//!
//! DESIGN
//! ======
//! One background task owns the draft. Edits arrive over a channel and re-arm
//! a trailing debounce timer, so a burst of typing produces a single save
//! once the writer goes idle for the configured interval. Saves run on their
//! own tasks and report back over a second channel, which keeps the command
//! loop responsive while a request is outstanding.
//!
//! At most one timer-driven save is in flight. If the timer fires while a
//! save is still running, the next save is queued until it completes; the
//! running save is never cancelled. Every save also holds the session's
//! [`WriteToken`], so nothing can be written once submission has sealed it.
//!
//! ERROR HANDLING
//! ==============
//! A failed save leaves the draft dirty and the content in memory. The
//! failure is logged and published on the status channel; the next timer or
//! explicit save retries with the latest content.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::debounce::{Debounce, sleep_until_opt};
use crate::error::ClientError;
use crate::writer::WriteToken;

/// Destination for draft saves.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Persist `content` as the current draft and return the server's
    /// `lastSaved` timestamp.
    async fn save_draft(&self, content: &str) -> Result<OffsetDateTime, ClientError>;
}

/// Observable auto-save state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveStatus {
    pub last_saved: Option<OffsetDateTime>,
    pub saving: bool,
    /// Content changed since the last successful save.
    pub dirty: bool,
    pub last_error: Option<String>,
    /// Save requests started, including failed ones.
    pub saves_issued: u64,
}

type SaveReply = oneshot::Sender<Result<Option<OffsetDateTime>, ClientError>>;

enum Command {
    Changed(String),
    SaveNow(SaveReply),
    SetEditable(bool),
    Shutdown,
}

struct SaveDone {
    content: String,
    result: Result<OffsetDateTime, ClientError>,
    reply: Option<SaveReply>,
}

/// Handle to a running auto-save task. Dropping it stops the timer.
pub struct AutoSaver {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl AutoSaver {
    /// Start the coordinator for a draft whose current content is `initial`.
    #[must_use]
    pub fn spawn(store: Arc<dyn DraftStore>, token: WriteToken, interval: Duration, initial: String, editable: bool) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::default());

        let coordinator = Coordinator {
            store,
            token,
            content: initial,
            dirty: false,
            editable,
            debounce: Debounce::new(interval),
            in_flight: 0,
            queued: false,
            done_tx,
            status: status_tx,
        };
        info!(interval_secs = interval.as_secs(), editable, "auto-save started");
        let task = tokio::spawn(coordinator.run(commands_rx, done_rx));

        Self { commands, status, task }
    }

    /// Report new editor content.
    pub fn changed(&self, content: impl Into<String>) {
        self.send(Command::Changed(content.into()));
    }

    /// Save immediately, bypassing the timer.
    ///
    /// Returns `Ok(None)` when there was nothing to save.
    ///
    /// # Errors
    ///
    /// [`ClientError::ReadOnly`] when the session is not editable, the
    /// store's error if the save fails, or [`ClientError::Cancelled`] if the
    /// coordinator has stopped.
    pub async fn save_now(&self) -> Result<Option<OffsetDateTime>, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SaveNow(reply));
        rx.await.map_err(|_| ClientError::Cancelled)?
    }

    /// Enable or disable saving. Disabling drops any pending timer.
    pub fn set_editable(&self, editable: bool) {
        self.send(Command::SetEditable(editable));
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Stop the timer loop. Saves already in flight still complete.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("auto-save task already stopped");
        }
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Coordinator {
    store: Arc<dyn DraftStore>,
    token: WriteToken,
    content: String,
    dirty: bool,
    editable: bool,
    debounce: Debounce,
    in_flight: usize,
    queued: bool,
    done_tx: mpsc::UnboundedSender<SaveDone>,
    status: watch::Sender<SaveStatus>,
}

impl Coordinator {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, mut done: mpsc::UnboundedReceiver<SaveDone>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Changed(content)) => self.on_changed(content),
                    Some(Command::SaveNow(reply)) => self.on_save_now(reply),
                    Some(Command::SetEditable(editable)) => self.on_set_editable(editable),
                    Some(Command::Shutdown) | None => break,
                },
                Some(finished) = done.recv() => self.on_done(finished),
                () = sleep_until_opt(self.debounce.due()) => self.on_timer(),
            }
        }
        debug!("auto-save stopped");
    }

    fn on_changed(&mut self, content: String) {
        if content == self.content {
            return;
        }
        self.content = content;
        if !self.editable {
            return;
        }
        self.dirty = true;
        self.debounce.touch();
        self.status.send_modify(|s| s.dirty = true);
    }

    fn on_save_now(&mut self, reply: SaveReply) {
        if !self.editable {
            let _ = reply.send(Err(ClientError::ReadOnly));
            return;
        }
        if is_empty(&self.content) {
            let _ = reply.send(Ok(None));
            return;
        }
        self.debounce.clear();
        self.issue(Some(reply));
    }

    fn on_set_editable(&mut self, editable: bool) {
        self.editable = editable;
        if !editable {
            self.debounce.clear();
            self.queued = false;
        }
    }

    fn on_timer(&mut self) {
        self.debounce.clear();
        if !self.dirty || !self.editable {
            return;
        }
        if is_empty(&self.content) {
            debug!("auto-save skipped: empty content");
            return;
        }
        if self.in_flight > 0 {
            self.queued = true;
            return;
        }
        self.issue(None);
    }

    fn on_done(&mut self, finished: SaveDone) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let SaveDone { content, result, reply } = finished;

        match &result {
            Ok(at) => {
                if content == self.content {
                    self.dirty = false;
                }
                info!(last_saved = %at, bytes = content.len(), "draft saved");
                self.status.send_modify(|s| {
                    s.last_saved = Some(*at);
                    s.last_error = None;
                });
            }
            Err(ClientError::AlreadySubmitted) => {
                debug!("draft save refused: session already submitted");
                self.editable = false;
                self.queued = false;
                self.debounce.clear();
            }
            Err(error) => {
                warn!(%error, "draft save failed; content kept locally");
                let message = error.user_message();
                self.status.send_modify(|s| s.last_error = Some(message));
                if self.dirty && self.editable {
                    self.debounce.touch();
                }
            }
        }

        let (dirty, saving) = (self.dirty, self.in_flight > 0);
        self.status.send_modify(|s| {
            s.dirty = dirty;
            s.saving = saving;
        });

        if let Some(reply) = reply {
            let _ = reply.send(result.map(Some));
        }

        if self.queued && self.in_flight == 0 {
            self.queued = false;
            if self.dirty && self.editable && !is_empty(&self.content) {
                self.issue(None);
            }
        }
    }

    fn issue(&mut self, reply: Option<SaveReply>) {
        self.in_flight += 1;
        self.status.send_modify(|s| {
            s.saving = true;
            s.saves_issued += 1;
        });

        let store = Arc::clone(&self.store);
        let token = self.token.clone();
        let done = self.done_tx.clone();
        let content = self.content.clone();
        tokio::spawn(async move {
            let result = save_with_token(store.as_ref(), &token, &content).await;
            let _ = done.send(SaveDone { content, result, reply });
        });
    }
}

async fn save_with_token(store: &dyn DraftStore, token: &WriteToken, content: &str) -> Result<OffsetDateTime, ClientError> {
    let _guard = token.acquire().await?;
    store.save_draft(content).await
}

fn is_empty(content: &str) -> bool {
    content.trim().is_empty()
}

#[cfg(test)]
#[path = "autosave_test.rs"]
mod tests;
