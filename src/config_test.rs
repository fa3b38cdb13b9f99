use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key: &str| map.get(key).cloned()
}

// =============================================================================
// parse_or
// =============================================================================

#[test]
fn parse_or_missing_returns_default() {
    let val: u64 = parse_or(None, 42);
    assert_eq!(val, 42);
}

#[test]
fn parse_or_present_valid() {
    let val: u64 = parse_or(Some(" 99 ".to_owned()), 0);
    assert_eq!(val, 99);
}

#[test]
fn parse_or_present_invalid_returns_default() {
    let val: u64 = parse_or(Some("notanumber".to_owned()), 7);
    assert_eq!(val, 7);
}

// =============================================================================
// from_lookup
// =============================================================================

#[test]
fn from_lookup_defaults() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[("HOME", "/home/alice")])).unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(
        cfg.timeouts,
        Timeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
    assert_eq!(cfg.autosave_interval, Duration::from_secs(30));
    assert_eq!(cfg.poll_interval, Duration::from_secs(60));
    assert_eq!(cfg.search_debounce, Duration::from_millis(300));
    assert_eq!(cfg.session_file, PathBuf::from("/home/alice/.workdesk/session.json"));
}

#[test]
fn from_lookup_parses_overrides() {
    let cfg = ClientConfig::from_lookup(lookup_from(&[
        ("WORKDESK_API_URL", "https://work.example.test/"),
        ("WORKDESK_REQUEST_TIMEOUT_SECS", "5"),
        ("WORKDESK_CONNECT_TIMEOUT_SECS", "2"),
        ("WORKDESK_AUTOSAVE_SECS", "10"),
        ("WORKDESK_POLL_SECS", "15"),
        ("WORKDESK_SEARCH_DEBOUNCE_MS", "150"),
        ("WORKDESK_SESSION_FILE", "/tmp/wd.json"),
    ]))
    .unwrap();
    assert_eq!(cfg.api_url, "https://work.example.test");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 5, connect_secs: 2 });
    assert_eq!(cfg.autosave_interval, Duration::from_secs(10));
    assert_eq!(cfg.poll_interval, Duration::from_secs(15));
    assert_eq!(cfg.search_debounce, Duration::from_millis(150));
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/wd.json"));
}

#[test]
fn from_lookup_rejects_non_http_url() {
    let err = ClientConfig::from_lookup(lookup_from(&[("WORKDESK_API_URL", "ftp://nope")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidApiUrl("ftp://nope".to_owned()));
}

#[test]
fn from_lookup_rejects_zero_autosave() {
    let err = ClientConfig::from_lookup(lookup_from(&[("WORKDESK_AUTOSAVE_SECS", "0")])).unwrap_err();
    assert_eq!(err, ConfigError::ZeroInterval { var: "WORKDESK_AUTOSAVE_SECS" });
}

#[test]
fn from_lookup_rejects_zero_poll() {
    let err = ClientConfig::from_lookup(lookup_from(&[("WORKDESK_POLL_SECS", "0")])).unwrap_err();
    assert!(err.to_string().contains("WORKDESK_POLL_SECS"));
}

// =============================================================================
// with_api_url
// =============================================================================

#[test]
fn with_api_url_trims_trailing_slash() {
    let cfg = ClientConfig::default().with_api_url("http://127.0.0.1:5000///").unwrap();
    assert_eq!(cfg.api_url, "http://127.0.0.1:5000");
}

#[test]
fn with_api_url_rejects_bare_host() {
    assert!(ClientConfig::default().with_api_url("localhost:5000").is_err());
}
