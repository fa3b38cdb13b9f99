//! Admin notification subscriber.
//!
//! DESIGN
//! ======
//! A background task holds one websocket to `/socket`, announces itself with
//! a `join-admin` event and collects `work-started` events into a bounded
//! feed, newest first. Connection state is published on a watch channel and
//! each event is also fanned out on a broadcast channel for live views.
//!
//! ERROR HANDLING
//! ==============
//! Any socket error or close ends the current connection; the task waits a
//! capped exponential backoff and reconnects. Events sent while disconnected
//! are not replayed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::access::{Resource, require};
use crate::auth::AuthSession;
use crate::error::ClientError;

pub const FEED_CAPACITY: usize = 10;
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(10);

const EVENT_BUFFER: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkStartedEvent {
    pub user_name: String,
    pub user_email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default)]
    pub project_link: String,
}

/// Messages exchanged on the push socket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum PushMessage {
    JoinAdmin,
    WorkStarted(WorkStartedEvent),
}

/// Decode one inbound frame. Unknown or malformed events yield `None`.
#[must_use]
pub fn parse_push_message(text: &str) -> Option<WorkStartedEvent> {
    match serde_json::from_str::<PushMessage>(text) {
        Ok(PushMessage::WorkStarted(event)) => Some(event),
        Ok(PushMessage::JoinAdmin) => None,
        Err(error) => {
            debug!(%error, "ignoring push message");
            None
        }
    }
}

/// # Errors
///
/// Serialization failure (not expected for a unit variant).
pub fn join_message() -> Result<String, ClientError> {
    Ok(serde_json::to_string(&PushMessage::JoinAdmin)?)
}

/// Map the API base URL to the push socket URL.
///
/// # Errors
///
/// [`ClientError::InvalidBaseUrl`] for anything but http(s).
pub fn ws_url(base_url: &str, token: &str) -> Result<String, ClientError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/socket?token={token}"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/socket?token={token}"));
    }
    Err(ClientError::InvalidBaseUrl(base_url.to_owned()))
}

/// Most-recent-first list of at most [`FEED_CAPACITY`] events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationFeed {
    entries: VecDeque<WorkStartedEvent>,
}

impl NotificationFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: WorkStartedEvent) {
        self.entries.push_front(event);
        self.entries.truncate(FEED_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&WorkStartedEvent> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkStartedEvent> {
        self.entries.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Reconnect delay: 1 s doubling up to 10 s, reset after a good connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    next: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { next: INITIAL_BACKOFF }
    }
}

impl Backoff {
    /// Delay to wait now; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(MAX_BACKOFF);
        delay
    }

    pub fn reset(&mut self) {
        self.next = INITIAL_BACKOFF;
    }
}

/// Add up to 10% random jitter.
fn jittered(delay: Duration) -> Duration {
    let max_ms = u64::try_from(delay.as_millis() / 10).unwrap_or(0);
    delay + Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// Handle to the running subscriber. Dropping it closes the socket.
pub struct NotificationSubscriber {
    feed: Arc<Mutex<NotificationFeed>>,
    status: watch::Receiver<ConnectionStatus>,
    events: broadcast::Sender<WorkStartedEvent>,
    task: JoinHandle<()>,
}

impl NotificationSubscriber {
    /// Start listening for work-started events.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] or [`ClientError::Forbidden`]
    /// unless `session` is an admin session, or
    /// [`ClientError::InvalidBaseUrl`].
    pub fn spawn(base_url: &str, session: Option<&AuthSession>) -> Result<Self, ClientError> {
        let session = require(session, Resource::Notifications)?.ok_or(ClientError::NotAuthenticated)?;
        let url = ws_url(base_url, &session.token)?;

        let feed = Arc::new(Mutex::new(NotificationFeed::new()));
        let (status_tx, status) = watch::channel(ConnectionStatus::Connecting);
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let listener = Listener { url, feed: Arc::clone(&feed), status: status_tx, events: events.clone() };
        info!(admin = %session.user.id, "notification subscriber starting");
        let task = tokio::spawn(listener.run());

        Ok(Self { feed, status, events, task })
    }

    /// Current feed, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<WorkStartedEvent> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WorkStartedEvent> {
        self.events.subscribe()
    }
}

impl Drop for NotificationSubscriber {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Listener {
    url: String,
    feed: Arc<Mutex<NotificationFeed>>,
    status: watch::Sender<ConnectionStatus>,
    events: broadcast::Sender<WorkStartedEvent>,
}

impl Listener {
    async fn run(self) {
        let mut backoff = Backoff::default();
        loop {
            self.status.send_replace(ConnectionStatus::Connecting);
            match self.connect_and_listen(&mut backoff).await {
                Ok(()) => info!("notification stream closed"),
                Err(error) => warn!(%error, "notification stream error"),
            }
            self.status.send_replace(ConnectionStatus::Disconnected);

            let delay = jittered(backoff.next_delay());
            debug!(?delay, "reconnecting notification stream");
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_and_listen(&self, backoff: &mut Backoff) -> Result<(), ClientError> {
        let (mut stream, _) = connect_async(self.url.as_str()).await?;
        stream.send(Message::Text(join_message()?.into())).await?;
        self.status.send_replace(ConnectionStatus::Connected);
        backoff.reset();
        info!("notification stream connected");

        while let Some(message) = stream.next().await {
            let event = match message? {
                Message::Text(text) => parse_push_message(text.as_str()),
                Message::Binary(bytes) => std::str::from_utf8(&bytes).ok().and_then(parse_push_message),
                Message::Close(_) => return Ok(()),
                _ => None,
            };
            if let Some(event) = event {
                self.deliver(event);
            }
        }
        Err(ClientError::WsClosed)
    }

    fn deliver(&self, event: WorkStartedEvent) {
        info!(user = %event.user_email, project_link = %event.project_link, "work started");
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
        if self.events.send(event).is_err() {
            debug!("no live notification listeners");
        }
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
