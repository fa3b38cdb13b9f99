use time::macros::datetime;

use super::*;

fn hm(hours: u64, minutes: u64) -> Duration {
    Duration::from_secs(hours * 3600 + minutes * 60)
}

// =============================================================
// format_remaining
// =============================================================

#[test]
fn formats_days_hours_minutes() {
    assert_eq!(format_remaining(Some(hm(49, 5))), "2d 1h 5m");
    assert_eq!(format_remaining(Some(hm(0, 59))), "0d 0h 59m");
}

#[test]
fn zero_or_absent_is_expired() {
    assert_eq!(format_remaining(None), "Time expired");
    assert_eq!(format_remaining(Some(Duration::ZERO)), "Time expired");
}

#[test]
fn days_left_rounds_up() {
    assert_eq!(days_left_from(hm(95, 0)), 4);
    assert_eq!(days_left_from(hm(24, 0)), 1);
    assert_eq!(days_left_from(Duration::from_secs(1)), 1);
    assert_eq!(days_left_from(Duration::ZERO), 0);
}

#[test]
fn days_left_label_pluralises() {
    assert_eq!(days_left_label(1), "1 day");
    assert_eq!(days_left_label(3), "3 days");
    assert_eq!(days_left_label(0), "0 days");
}

// =============================================================
// Countdown
// =============================================================

#[test]
fn countdown_never_increases_within_one_epoch() {
    let epoch = Some(datetime!(2025-03-01 09:00 UTC));
    let mut countdown = Countdown::new();
    assert_eq!(countdown.observe(hm(2, 0), epoch), hm(2, 0));
    assert_eq!(countdown.observe(hm(1, 59), epoch), hm(1, 59));
    // Stale response with more time left than already shown.
    assert_eq!(countdown.observe(hm(2, 0), epoch), hm(1, 59));
    assert_eq!(countdown.remaining(), Some(hm(1, 59)));
}

#[test]
fn countdown_resets_on_new_epoch() {
    let mut countdown = Countdown::new();
    countdown.observe(Duration::ZERO, Some(datetime!(2025-03-01 09:00 UTC)));
    assert!(countdown.is_expired());

    let restarted = countdown.observe(hm(96, 0), Some(datetime!(2025-03-10 09:00 UTC)));
    assert_eq!(restarted, hm(96, 0));
    assert!(!countdown.is_expired());
}

#[test]
fn reset_clears_state() {
    let mut countdown = Countdown::new();
    countdown.observe(hm(1, 0), None);
    countdown.reset();
    assert_eq!(countdown.remaining(), None);
    assert_eq!(countdown.formatted(), "Time expired");
}
