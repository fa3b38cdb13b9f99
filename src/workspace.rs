//! Editor workspace for one user's work session.
//!
//! DESIGN
//! ======
//! The workspace owns the editor, an [`AutoSaver`], a [`SubmissionGate`] and
//! a polling task. All of them share one [`WriteToken`], sealed up front when
//! the server already reports the work as submitted.
//!
//! The poller asks the [`StatusSource`] for the dashboard status on a fixed
//! interval, feeds the server's `timeRemaining` into the [`Countdown`] and
//! publishes a [`WorkspaceState`] on a watch channel. When the resolved
//! status stops being editable the editor and auto-save are switched off.
//!
//! ERROR HANDLING
//! ==============
//! A failed poll is logged and the previous state is kept; the next tick
//! retries. Opening the workspace propagates the first fetch's error.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::types::DashboardResponse;
use crate::autosave::{AutoSaver, DraftStore, SaveStatus};
use crate::config::ClientConfig;
use crate::editor::Editor;
use crate::error::ClientError;
use crate::session::countdown::{days_left_from, format_remaining};
use crate::session::{Countdown, StatusSnapshot, WorkSession, WorkStatus, resolve};
use crate::submission::{Confirm, SubmissionGate, SubmitReceipt, SubmitSink};
use crate::writer::WriteToken;

/// Where the workspace reads session status and the saved draft from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<RemoteStatus, ClientError>;

    /// Saved draft content, empty when there is none.
    async fn load_draft(&self) -> Result<String, ClientError>;
}

/// One dashboard poll result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteStatus {
    pub reported: WorkStatus,
    pub time_remaining_ms: Option<i64>,
    pub session: WorkSession,
}

impl RemoteStatus {
    #[must_use]
    pub fn snapshot(&self, now: OffsetDateTime) -> StatusSnapshot {
        StatusSnapshot::from_remote(self.reported, self.time_remaining_ms, &self.session, now)
    }
}

impl From<DashboardResponse> for RemoteStatus {
    fn from(response: DashboardResponse) -> Self {
        Self {
            reported: response.work_status,
            time_remaining_ms: response.time_remaining,
            session: response.to_session(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub autosave_interval: Duration,
    pub poll_interval: Duration,
}

impl From<&ClientConfig> for WorkspaceConfig {
    fn from(config: &ClientConfig) -> Self {
        Self { autosave_interval: config.autosave_interval, poll_interval: config.poll_interval }
    }
}

/// What the dashboard and editor render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceState {
    pub snapshot: StatusSnapshot,
    /// Countdown value after clamping; `None` before the first in-window poll.
    pub remaining: Option<Duration>,
    pub read_only: bool,
}

impl WorkspaceState {
    #[must_use]
    pub fn countdown(&self) -> String {
        format_remaining(self.remaining)
    }

    #[must_use]
    pub fn days_left(&self) -> u64 {
        self.remaining.map_or(0, days_left_from)
    }
}

struct Shared {
    editor: Editor,
    session: WorkSession,
    countdown: Countdown,
    snapshot: StatusSnapshot,
    submitted: bool,
}

impl Shared {
    fn view(&self) -> WorkspaceState {
        WorkspaceState {
            snapshot: self.snapshot.clone(),
            remaining: self.countdown.remaining(),
            read_only: self.editor.is_read_only(),
        }
    }
}

struct Inner {
    source: Arc<dyn StatusSource>,
    shared: Mutex<Shared>,
    autosaver: AutoSaver,
    state: watch::Sender<WorkspaceState>,
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn poll(&self) -> Result<WorkspaceState, ClientError> {
        let remote = self.source.fetch_status().await?;
        Ok(self.apply(&remote, OffsetDateTime::now_utc()))
    }

    fn apply(&self, remote: &RemoteStatus, now: OffsetDateTime) -> WorkspaceState {
        let mut shared = self.lock();
        if shared.submitted {
            debug!("ignoring poll after local submission");
            return shared.view();
        }

        let snapshot = remote.snapshot(now);
        match snapshot.status {
            WorkStatus::InProgress | WorkStatus::Penalized => {
                shared.countdown.observe(snapshot.time_remaining, remote.session.started_at());
            }
            _ => shared.countdown.reset(),
        }

        let editable = snapshot.editable();
        if shared.editor.is_read_only() == editable {
            info!(status = %snapshot.status, editable, "work status changed");
            shared.editor.set_read_only(!editable);
            self.autosaver.set_editable(editable);
        }
        shared.session = remote.session.clone();
        shared.snapshot = snapshot;

        let view = shared.view();
        drop(shared);
        self.state.send_replace(view.clone());
        view
    }
}

/// Live editing session. Dropping it stops the poller and auto-save.
pub struct Workspace {
    inner: Arc<Inner>,
    gate: SubmissionGate,
    poller: JoinHandle<()>,
}

impl Workspace {
    /// Fetch status and draft, then start auto-save and polling.
    ///
    /// # Errors
    ///
    /// The first status or draft fetch failing.
    pub async fn open(
        source: Arc<dyn StatusSource>,
        drafts: Arc<dyn DraftStore>,
        sink: Arc<dyn SubmitSink>,
        config: WorkspaceConfig,
    ) -> Result<Self, ClientError> {
        let remote = source.fetch_status().await?;
        let mut content = source.load_draft().await?;
        if content.is_empty() {
            content = remote.session.content().to_owned();
        }

        let now = OffsetDateTime::now_utc();
        let snapshot = remote.snapshot(now);
        let editable = snapshot.editable();
        let token = if snapshot.status == WorkStatus::Submitted { WriteToken::sealed() } else { WriteToken::new() };

        let mut countdown = Countdown::new();
        if matches!(snapshot.status, WorkStatus::InProgress | WorkStatus::Penalized) {
            countdown.observe(snapshot.time_remaining, remote.session.started_at());
        }

        let autosaver = AutoSaver::spawn(drafts, token.clone(), config.autosave_interval, content.clone(), editable);
        let shared = Shared {
            editor: Editor::new(content, !editable),
            session: remote.session,
            countdown,
            snapshot,
            submitted: false,
        };
        let (state, _) = watch::channel(shared.view());
        info!(status = %shared.snapshot.status, editable, "workspace opened");

        let inner = Arc::new(Inner { source, shared: Mutex::new(shared), autosaver, state });
        let poller = spawn_poller(Arc::clone(&inner), config.poll_interval);
        let gate = SubmissionGate::new(sink, token);

        Ok(Self { inner, gate, poller })
    }

    /// Open against the live API using the configured intervals.
    ///
    /// # Errors
    ///
    /// See [`Workspace::open`].
    pub async fn for_client(client: crate::api::ApiClient, config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Arc::new(client);
        let source: Arc<dyn StatusSource> = client.clone();
        let drafts: Arc<dyn DraftStore> = client.clone();
        let sink: Arc<dyn SubmitSink> = client;
        Self::open(source, drafts, sink, WorkspaceConfig::from(config)).await
    }

    /// Replace the editor content and schedule an auto-save.
    ///
    /// # Errors
    ///
    /// [`ClientError::ReadOnly`] when the session is not editable.
    pub fn edit(&self, html: impl Into<String>) -> Result<u64, ClientError> {
        let html = html.into();
        let revision = self.inner.lock().editor.replace(html.clone())?;
        self.inner.autosaver.changed(html);
        Ok(revision)
    }

    /// Save now, bypassing the auto-save timer.
    ///
    /// # Errors
    ///
    /// See [`AutoSaver::save_now`].
    pub async fn save(&self) -> Result<Option<OffsetDateTime>, ClientError> {
        let saved = self.inner.autosaver.save_now().await?;
        if let Some(at) = saved {
            self.inner.lock().session.record_save(at);
        }
        Ok(saved)
    }

    /// Submit the current content as final.
    ///
    /// On success the session is marked submitted locally and the editor
    /// becomes read-only without waiting for the next poll.
    ///
    /// # Errors
    ///
    /// [`ClientError::AlreadySubmitted`] after a successful submit, otherwise
    /// see [`SubmissionGate::submit`].
    pub async fn submit(&self, confirm: &dyn Confirm) -> Result<SubmitReceipt, ClientError> {
        let (html, editable) = {
            let shared = self.inner.lock();
            if shared.submitted || shared.snapshot.status == WorkStatus::Submitted {
                return Err(ClientError::AlreadySubmitted);
            }
            (shared.editor.html().to_owned(), !shared.editor.is_read_only())
        };

        let receipt = self.gate.submit(&html, editable, confirm).await?;
        self.inner.autosaver.set_editable(false);

        let now = OffsetDateTime::now_utc();
        let mut shared = self.inner.lock();
        shared.submitted = true;
        shared.editor.set_read_only(true);
        if let Err(error) = shared.session.submit(now) {
            debug!(%error, "local session already past submit");
        }
        shared.snapshot = resolve(&shared.session, now);
        shared.snapshot.confirm_submitted(receipt.review_deadline, now);
        shared.countdown.reset();
        let view = shared.view();
        drop(shared);
        self.inner.state.send_replace(view);

        Ok(receipt)
    }

    /// Poll the server once, outside the regular interval.
    ///
    /// # Errors
    ///
    /// The status fetch failing.
    pub async fn refresh(&self) -> Result<WorkspaceState, ClientError> {
        self.inner.poll().await
    }

    #[must_use]
    pub fn state(&self) -> WorkspaceState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkspaceState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn save_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.autosaver.subscribe()
    }

    #[must_use]
    pub fn html(&self) -> String {
        self.inner.lock().editor.html().to_owned()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.gate.is_submitting()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.poller.abort();
        self.inner.autosaver.shutdown();
    }
}

fn spawn_poller(inner: Arc<Inner>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match inner.poll().await {
                Ok(state) => debug!(status = %state.snapshot.status, countdown = %state.countdown(), "status polled"),
                Err(error) => warn!(%error, "status poll failed"),
            }
        }
    })
}

#[cfg(test)]
#[path = "workspace_test.rs"]
mod tests;
