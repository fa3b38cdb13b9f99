use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::*;

const INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default)]
struct FakeStore {
    calls: AtomicU64,
    saved: Mutex<Vec<String>>,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl FakeStore {
    fn slow(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl DraftStore for FakeStore {
    async fn save_draft(&self, content: &str) -> Result<OffsetDateTime, ClientError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).push(content.to_owned());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected { status: 500, message: "disk full".to_owned() });
        }
        Ok(OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(i64::try_from(n).unwrap()))
    }
}

fn spawn_with(store: &Arc<FakeStore>, token: WriteToken, editable: bool) -> AutoSaver {
    let dyn_store: Arc<dyn DraftStore> = store.clone();
    AutoSaver::spawn(dyn_store, token, INTERVAL, "<p>initial</p>".to_owned(), editable)
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// =============================================================
// Debounced saves
// =============================================================

#[tokio::test(start_paused = true)]
async fn continuous_typing_issues_one_save_per_idle_period() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);

    for i in 0..20 {
        saver.changed(format!("<p>draft {i}</p>"));
        advance(1).await;
    }
    assert_eq!(store.calls(), 0);

    advance(28).await;
    assert_eq!(store.calls(), 0);

    advance(3).await;
    assert_eq!(store.calls(), 1);
    assert_eq!(store.saved(), vec!["<p>draft 19</p>".to_owned()]);

    let status = saver.status();
    assert!(!status.dirty);
    assert_eq!(status.saves_issued, 1);
    assert!(status.last_saved.is_some());
}

#[tokio::test(start_paused = true)]
async fn separate_idle_periods_each_save() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("<p>one</p>");
    advance(31).await;
    saver.changed("<p>two</p>");
    advance(31).await;

    assert_eq!(store.saved(), vec!["<p>one</p>".to_owned(), "<p>two</p>".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn unchanged_content_does_not_arm_timer() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);
    saver.changed("<p>initial</p>");
    advance(60).await;
    assert_eq!(store.calls(), 0);
    assert!(!saver.status().dirty);
}

#[tokio::test(start_paused = true)]
async fn empty_content_is_not_saved() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("   ");
    advance(31).await;
    assert_eq!(store.calls(), 0);
    assert_eq!(saver.save_now().await.unwrap(), None);
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn edit_during_save_queues_follow_up_save() {
    let store = Arc::new(FakeStore::slow(Duration::from_secs(40)));
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("<p>a</p>");
    advance(31).await;
    assert_eq!(store.calls(), 1);
    assert!(saver.status().saving);

    // Timer for this edit fires while the first save is still running.
    saver.changed("<p>ab</p>");
    advance(35).await;
    assert_eq!(store.calls(), 1);

    advance(60).await;
    assert_eq!(store.saved(), vec!["<p>a</p>".to_owned(), "<p>ab</p>".to_owned()]);
    advance(60).await;
    assert!(!saver.status().dirty);
}

// =============================================================
// Explicit save
// =============================================================

#[tokio::test(start_paused = true)]
async fn save_now_bypasses_timer() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("<p>typed</p>");
    let saved_at = saver.save_now().await.unwrap();
    assert!(saved_at.is_some());
    assert_eq!(store.saved(), vec!["<p>typed</p>".to_owned()]);

    // The pending timer was consumed by the explicit save.
    advance(60).await;
    assert_eq!(store.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn save_now_when_read_only_is_rejected() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), false);

    saver.changed("<p>late</p>");
    assert!(matches!(saver.save_now().await, Err(ClientError::ReadOnly)));
    advance(60).await;
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_draft_dirty_until_retry() {
    let store = Arc::new(FakeStore::default());
    store.fail.store(true, Ordering::SeqCst);
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("<p>precious</p>");
    let err = saver.save_now().await.unwrap_err();
    assert_eq!(err.user_message(), "disk full");
    let status = saver.status();
    assert!(status.dirty);
    assert_eq!(status.last_error.as_deref(), Some("disk full"));

    store.fail.store(false, Ordering::SeqCst);
    assert!(saver.save_now().await.unwrap().is_some());
    let status = saver.status();
    assert!(!status.dirty);
    assert!(status.last_error.is_none());
    assert_eq!(store.saved(), vec!["<p>precious</p>".to_owned(), "<p>precious</p>".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn failed_timer_save_is_retried_on_next_interval() {
    let store = Arc::new(FakeStore::default());
    store.fail.store(true, Ordering::SeqCst);
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("<p>precious</p>");
    advance(31).await;
    assert_eq!(store.calls(), 1);
    assert!(saver.status().dirty);

    store.fail.store(false, Ordering::SeqCst);
    advance(31).await;
    assert_eq!(store.calls(), 2);
    let status = saver.status();
    assert!(!status.dirty);
    assert!(status.last_error.is_none());
    assert_eq!(store.saved(), vec!["<p>precious</p>".to_owned(), "<p>precious</p>".to_owned()]);
}

// =============================================================
// Editability and the write token
// =============================================================

#[tokio::test(start_paused = true)]
async fn set_editable_false_cancels_pending_timer() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);

    saver.changed("<p>x</p>");
    advance(10).await;
    saver.set_editable(false);
    advance(60).await;
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn sealed_token_blocks_saves_and_disables_autosave() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::sealed(), true);

    saver.changed("<p>after submit</p>");
    assert!(matches!(saver.save_now().await, Err(ClientError::AlreadySubmitted)));
    assert_eq!(store.calls(), 0);

    saver.changed("<p>more</p>");
    advance(60).await;
    assert_eq!(store.calls(), 0);
    assert!(matches!(saver.save_now().await, Err(ClientError::ReadOnly)));
}

#[tokio::test(start_paused = true)]
async fn dropping_handle_stops_timer() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);
    saver.changed("<p>x</p>");
    drop(saver);
    advance(60).await;
    assert_eq!(store.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn save_now_after_shutdown_is_cancelled() {
    let store = Arc::new(FakeStore::default());
    let saver = spawn_with(&store, WriteToken::new(), true);
    saver.shutdown();
    advance(1).await;
    assert!(matches!(saver.save_now().await, Err(ClientError::Cancelled)));
}
