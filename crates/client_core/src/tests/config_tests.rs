use super::*;

use std::collections::HashMap;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn local_hostnames_resolve_to_dev_server() {
    assert_eq!(resolve_server_url("localhost"), LOCAL_SERVER_URL);
    assert_eq!(resolve_server_url("127.0.0.1"), LOCAL_SERVER_URL);
    assert_eq!(resolve_server_url("vibrationrobotics.com"), DEPLOYED_SERVER_URL);
    assert_eq!(resolve_server_url(""), DEPLOYED_SERVER_URL);
}

#[test]
fn explicit_server_url_wins_over_hostname() {
    let config = ClientConfig {
        server_url: Some("http://10.0.0.5:8080/".into()),
        hostname: "example.org".into(),
        ..ClientConfig::default()
    };
    assert_eq!(config.server_url().expect("url"), "http://10.0.0.5:8080");
}

#[test]
fn blank_server_url_falls_back_to_hostname() {
    let config = ClientConfig {
        server_url: Some("   ".into()),
        hostname: "contracts.example.org".into(),
        ..ClientConfig::default()
    };
    assert_eq!(config.server_url().expect("url"), DEPLOYED_SERVER_URL);
}

#[test]
fn rejects_non_http_server_url() {
    let config = ClientConfig {
        server_url: Some("ftp://example.org".into()),
        ..ClientConfig::default()
    };
    assert!(matches!(config.server_url(), Err(ClientError::Config(_))));
}

#[test]
fn file_values_override_defaults() {
    let mut config = ClientConfig::default();
    config.apply_file(
        r#"
        hostname = "vibrationrobotics.com"
        request_timeout_secs = 30
        reanalyze_after_rewrite = true
        "#,
    );
    assert_eq!(config.hostname, "vibrationrobotics.com");
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
    assert!(config.workflow_options().reanalyze_after_rewrite);
    assert!(config.auto_analyze);
}

#[test]
fn unreadable_file_is_ignored() {
    let mut config = ClientConfig::default();
    config.apply_file("hostname = [unterminated");
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn env_overrides_file_and_ignores_garbage() {
    let mut config = ClientConfig::default();
    config.apply_file("request_timeout_secs = 30");
    config.apply_env(env_of(&[
        ("APP__SERVER_URL", "http://127.0.0.1:9000"),
        ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
        ("APP__AUTO_ANALYZE", "off"),
        ("APP__USE_AI_POSITIONING", "maybe"),
    ]));

    assert_eq!(config.server_url.as_deref(), Some("http://127.0.0.1:9000"));
    assert_eq!(config.request_timeout_secs, 30);
    assert!(!config.auto_analyze);
    assert!(config.use_ai_positioning);
}
