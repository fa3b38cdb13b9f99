use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use time::macros::datetime;

use super::*;

#[derive(Default)]
struct FakeSink {
    calls: AtomicUsize,
    reject: AtomicBool,
    delay: Option<Duration>,
}

impl FakeSink {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmitSink for FakeSink {
    async fn submit_work(&self, _content: &str) -> Result<SubmitReceipt, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected { status: 400, message: "Work deadline has passed".to_owned() });
        }
        Ok(SubmitReceipt {
            message: "Work submitted successfully".to_owned(),
            review_deadline: Some(datetime!(2025-03-03 09:00 UTC)),
        })
    }
}

fn gate(sink: &Arc<FakeSink>, token: WriteToken) -> SubmissionGate {
    let dyn_sink: Arc<dyn SubmitSink> = sink.clone();
    SubmissionGate::new(dyn_sink, token)
}

fn yes(_prompt: &str) -> bool {
    true
}

fn no(_prompt: &str) -> bool {
    false
}

// =============================================================
// Preconditions (no network)
// =============================================================

#[tokio::test]
async fn blank_content_rejected_before_network() {
    let sink = Arc::new(FakeSink::default());
    let gate = gate(&sink, WriteToken::new());

    for blank in ["", "   \n", "<p><br></p>"] {
        assert!(matches!(gate.submit(blank, true, &yes).await, Err(ClientError::EmptyContent)));
    }
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn read_only_session_is_rejected() {
    let sink = Arc::new(FakeSink::default());
    let gate = gate(&sink, WriteToken::new());
    assert!(matches!(gate.submit("<p>x</p>", false, &yes).await, Err(ClientError::ReadOnly)));
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn declined_confirmation_cancels() {
    let sink = Arc::new(FakeSink::default());
    let gate = gate(&sink, WriteToken::new());
    assert!(matches!(gate.submit("<p>x</p>", true, &no).await, Err(ClientError::Cancelled)));
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn confirm_receives_prompt() {
    let sink = Arc::new(FakeSink::default());
    let gate = gate(&sink, WriteToken::new());
    let check = |prompt: &str| prompt == CONFIRM_PROMPT;
    assert!(gate.submit("<p>x</p>", true, &check).await.is_ok());
}

// =============================================================
// Submit flow
// =============================================================

#[tokio::test]
async fn success_seals_token() {
    let sink = Arc::new(FakeSink::default());
    let token = WriteToken::new();
    let gate = gate(&sink, token.clone());

    let receipt = gate.submit("<p>final</p>", true, &yes).await.unwrap();
    assert_eq!(receipt.message, "Work submitted successfully");
    assert!(token.is_sealed().await);
    assert!(!gate.is_submitting());

    assert!(matches!(gate.submit("<p>again</p>", true, &yes).await, Err(ClientError::AlreadySubmitted)));
    assert_eq!(sink.calls(), 1);
}

#[tokio::test]
async fn rejection_leaves_token_open_for_retry() {
    let sink = Arc::new(FakeSink::default());
    sink.reject.store(true, Ordering::SeqCst);
    let token = WriteToken::new();
    let gate = gate(&sink, token.clone());

    let err = gate.submit("<p>final</p>", true, &yes).await.unwrap_err();
    assert_eq!(err.user_message(), "Work deadline has passed");
    assert!(!token.is_sealed().await);
    assert!(!gate.is_submitting());

    sink.reject.store(false, Ordering::SeqCst);
    assert!(gate.submit("<p>final</p>", true, &yes).await.is_ok());
    assert_eq!(sink.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_double_submit_sends_once() {
    let sink = Arc::new(FakeSink { delay: Some(Duration::from_secs(2)), ..FakeSink::default() });
    let gate = gate(&sink, WriteToken::new());

    let (first, second) = tokio::join!(gate.submit("<p>a</p>", true, &yes), gate.submit("<p>a</p>", true, &yes));
    assert!(first.is_ok());
    assert!(matches!(second, Err(ClientError::SubmitInProgress)));
    assert_eq!(sink.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn submit_waits_for_in_flight_writer() {
    let sink = Arc::new(FakeSink::default());
    let token = WriteToken::new();
    let gate = gate(&sink, token.clone());

    let save_guard = token.acquire().await.unwrap();
    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(save_guard);
    });

    let started = tokio::time::Instant::now();
    gate.submit("<p>final</p>", true, &yes).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(5));
    release.await.unwrap();
}

// =============================================================
// SubmitReceipt
// =============================================================

#[test]
fn receipt_summary_includes_review_deadline() {
    let receipt = SubmitReceipt {
        message: "Submitted".to_owned(),
        review_deadline: Some(datetime!(2025-03-03 09:00 UTC)),
    };
    assert_eq!(receipt.summary(), "Submitted\n\nReview deadline: 2025-03-03T09:00:00Z");

    let bare = SubmitReceipt { message: "Submitted".to_owned(), review_deadline: None };
    assert_eq!(bare.summary(), "Submitted");
}

#[test]
fn receipt_parses_wire_shape() {
    let receipt: SubmitReceipt =
        serde_json::from_str(r#"{"message":"ok","reviewDeadline":"2025-03-03T09:00:00.000Z"}"#).unwrap();
    assert_eq!(receipt.review_deadline, Some(datetime!(2025-03-03 09:00 UTC)));
}
