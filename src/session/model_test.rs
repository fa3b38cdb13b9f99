use time::macros::datetime;

use super::*;

const T0: OffsetDateTime = datetime!(2025-03-01 09:00 UTC);

// =============================================================
// Derived deadlines
// =============================================================

#[test]
fn new_session_has_no_deadlines() {
    let session = WorkSession::new();
    assert!(session.deadline().is_none());
    assert!(session.review_deadline().is_none());
}

#[test]
fn deadline_is_start_plus_96_hours() {
    let session = WorkSession::started(T0);
    assert_eq!(session.deadline(), Some(datetime!(2025-03-05 09:00 UTC)));
}

#[test]
fn review_deadline_is_submit_plus_24_hours() {
    let mut session = WorkSession::started(T0);
    session.submit(T0 + Duration::hours(10)).unwrap();
    assert_eq!(session.review_deadline(), Some(datetime!(2025-03-02 19:00 UTC)));
}

// =============================================================
// start
// =============================================================

#[test]
fn start_sets_clock_once() {
    let mut session = WorkSession::new();
    session.start(T0).unwrap();
    assert_eq!(session.started_at(), Some(T0));

    let err = session.start(T0 + Duration::hours(1)).unwrap_err();
    assert!(matches!(err, ClientError::AlreadyStarted));
    assert_eq!(session.deadline(), Some(T0 + WORK_WINDOW));
}

// =============================================================
// submit
// =============================================================

#[test]
fn submit_requires_start() {
    let mut session = WorkSession::new();
    assert!(matches!(session.submit(T0), Err(ClientError::NotStarted)));
}

#[test]
fn submit_rejected_while_penalized() {
    let mut session = WorkSession::started(T0);
    session.penalize(Some("late".to_owned()));
    assert!(matches!(session.submit(T0 + Duration::hours(1)), Err(ClientError::Penalized)));
    assert!(session.submitted_at().is_none());
}

#[test]
fn submit_is_write_once() {
    let mut session = WorkSession::started(T0);
    session.submit(T0 + Duration::hours(1)).unwrap();
    assert!(matches!(session.submit(T0 + Duration::hours(2)), Err(ClientError::AlreadySubmitted)));
    assert_eq!(session.submitted_at(), Some(T0 + Duration::hours(1)));
}

// =============================================================
// edit
// =============================================================

#[test]
fn edit_allowed_in_progress() {
    let mut session = WorkSession::started(T0);
    session.edit("<p>draft</p>", T0 + Duration::hours(2)).unwrap();
    assert_eq!(session.content(), "<p>draft</p>");
}

#[test]
fn edit_before_start_is_not_started() {
    let mut session = WorkSession::new();
    assert!(matches!(session.edit("x", T0), Err(ClientError::NotStarted)));
}

#[test]
fn edit_after_submit_is_rejected_and_content_kept() {
    let mut session = WorkSession::started(T0).with_content("<p>final</p>");
    session.submit(T0 + Duration::hours(3)).unwrap();
    let err = session.edit("<p>changed</p>", T0 + Duration::hours(4)).unwrap_err();
    assert!(matches!(err, ClientError::ReadOnly));
    assert_eq!(session.content(), "<p>final</p>");
}

#[test]
fn edit_after_deadline_is_rejected() {
    let mut session = WorkSession::started(T0);
    assert!(matches!(session.edit("x", T0 + Duration::hours(97)), Err(ClientError::ReadOnly)));
}

#[test]
fn edit_while_penalized_is_rejected() {
    let mut session = WorkSession::started(T0);
    session.penalize(None);
    assert!(matches!(session.edit("x", T0 + Duration::hours(1)), Err(ClientError::ReadOnly)));
}

// =============================================================
// penalty
// =============================================================

#[test]
fn remove_penalty_keeps_original_deadline() {
    let mut session = WorkSession::started(T0);
    session.penalize(Some("missed check-in".to_owned()));
    assert_eq!(session.penalized_reason(), Some("missed check-in"));
    session.remove_penalty();
    assert!(!session.is_penalized());
    assert!(session.penalized_reason().is_none());
    assert_eq!(session.deadline(), Some(T0 + WORK_WINDOW));
}

#[test]
fn with_penalty_false_drops_reason() {
    let session = WorkSession::started(T0).with_penalty(false, Some("ignored".to_owned()));
    assert!(session.penalized_reason().is_none());
}

#[test]
fn record_save_updates_last_saved() {
    let mut session = WorkSession::started(T0);
    session.record_save(T0 + Duration::minutes(5));
    assert_eq!(session.last_saved(), Some(T0 + Duration::minutes(5)));
}
