use serde_json::json;

use super::*;
use crate::config::ClientConfig;

#[test]
fn defaults_match_branding() {
    let config = SiteConfig::default();
    assert_eq!(config.navbar_title, "DataEntry Pro");
    assert_eq!(config.footer_email, "bforboll81@gmail.com");
    assert!(config.validate().is_ok());
}

#[test]
fn partial_payload_keeps_defaults() {
    let response: SiteConfigResponse =
        serde_json::from_value(json!({ "config": { "navbarTitle": "Acme Data" } })).unwrap();
    assert_eq!(response.config.navbar_title, "Acme Data");
    assert_eq!(response.config.footer_address, DEFAULT_ADDRESS);
}

#[test]
fn serializes_camel_case() {
    let value = serde_json::to_value(SiteConfig::default()).unwrap();
    assert_eq!(value["footerContactNumber"], "+1 (555) 123-4567");
}

#[test]
fn validate_rejects_blank_and_bad_email() {
    let blank = SiteConfig { navbar_title: "  ".to_owned(), ..SiteConfig::default() };
    assert_eq!(blank.validate().unwrap_err().to_string(), "Navbar title is required");

    let bad_email = SiteConfig { footer_email: "nobody".to_owned(), ..SiteConfig::default() };
    assert!(matches!(bad_email.validate(), Err(ClientError::Validation(_))));
}

#[test]
fn patch_replaces_only_given_fields() {
    let patch = SiteConfigPatch { footer_email: Some("ops@acme.test".to_owned()), ..SiteConfigPatch::default() };
    assert!(!patch.is_empty());

    let patched = SiteConfig::default().patched(&patch);
    assert_eq!(patched.footer_email, "ops@acme.test");
    assert_eq!(patched.navbar_title, DEFAULT_NAVBAR_TITLE);
    assert!(SiteConfigPatch::default().is_empty());
}

#[tokio::test]
async fn unreachable_server_falls_back_to_defaults() {
    let config = ClientConfig::default().with_api_url("http://127.0.0.1:9").unwrap();
    let client = ApiClient::new(&config).unwrap();
    assert_eq!(load_or_default(&client).await, SiteConfig::default());
}
