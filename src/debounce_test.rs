use super::*;

const DELAY: Duration = Duration::from_millis(300);

#[test]
fn new_timer_is_disarmed() {
    let debounce = Debounce::new(DELAY);
    assert!(!debounce.is_armed());
    assert!(!debounce.is_due(Instant::now()));
}

#[test]
fn touch_rearms_from_latest_edit() {
    let start = Instant::now();
    let mut debounce = Debounce::new(DELAY);
    debounce.touch_at(start);
    debounce.touch_at(start + Duration::from_millis(200));

    assert!(!debounce.is_due(start + Duration::from_millis(400)));
    assert!(debounce.is_due(start + Duration::from_millis(500)));
}

#[test]
fn take_if_due_disarms_once() {
    let start = Instant::now();
    let mut debounce = Debounce::new(DELAY);
    debounce.touch_at(start);

    assert!(!debounce.take_if_due(start));
    assert!(debounce.take_if_due(start + DELAY));
    assert!(!debounce.take_if_due(start + DELAY * 2));
    assert!(!debounce.is_armed());
}

#[test]
fn clear_disarms() {
    let mut debounce = Debounce::new(DELAY);
    debounce.touch();
    debounce.clear();
    assert!(debounce.due().is_none());
}

#[tokio::test(start_paused = true)]
async fn sleep_until_opt_waits_for_due_instant() {
    let mut debounce = Debounce::new(DELAY);
    let due = debounce.touch();
    sleep_until_opt(debounce.due()).await;
    assert!(Instant::now() >= due);
}

#[tokio::test(start_paused = true)]
async fn sleep_until_opt_disarmed_never_fires() {
    let fired = tokio::time::timeout(Duration::from_secs(3600), sleep_until_opt(None)).await;
    assert!(fired.is_err());
}
