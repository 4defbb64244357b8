use std::fs;
use std::time::Duration;

use jobscout_app::logging::LogDestination;
use jobscout_app::{ConfigError, ReconnectConfig, ScoutConfig};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn missing_path_uses_local_defaults() {
    let config = ScoutConfig::load_or_default(None).unwrap();
    assert_eq!(config, ScoutConfig::default());
    assert_eq!(config.base_url, "http://localhost:8080/api/jobs");
    assert_eq!(config.bulk_base_url, "http://localhost:8080/api/sequential/jobs");
    assert_eq!(config.reconnect, ReconnectConfig::Never);
}

#[test]
fn partial_file_overrides_only_given_fields() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("jobscout.ron");
    fs::write(
        &path,
        r#"(
            base_url: "https://scrape.example.com/api/jobs",
            request_timeout_ms: 1500,
            reconnect: Backoff(initial_ms: 250, max_ms: 4000, max_attempts: 5),
            log: Both,
        )"#,
    )
    .unwrap();

    let config = ScoutConfig::load(&path).unwrap();
    assert_eq!(config.base_url, "https://scrape.example.com/api/jobs");
    assert_eq!(config.bulk_base_url, ScoutConfig::default().bulk_base_url);
    assert_eq!(config.log, LogDestination::Both);

    let commands = config.command_settings();
    assert_eq!(commands.request_timeout, Duration::from_millis(1500));
    assert_eq!(
        config.channel_settings().base_url,
        "https://scrape.example.com/api/jobs"
    );

    let mut policy = config.reconnect_policy();
    assert_eq!(policy.next_delay(1), Some(Duration::from_millis(250)));
    assert_eq!(policy.next_delay(6), None);
}

#[test]
fn invalid_base_url_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("jobscout.ron");
    fs::write(&path, r#"(base_url: "ftp//nope")"#).unwrap();

    let err = ScoutConfig::load(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidUrl {
            field: "base_url",
            ..
        }
    ));
}

#[test]
fn unreadable_or_garbled_files_fail() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.ron");
    assert!(matches!(
        ScoutConfig::load(&missing),
        Err(ConfigError::Io { .. })
    ));

    let garbled = temp.path().join("garbled.ron");
    fs::write(&garbled, "(base_url: 42").unwrap();
    assert!(matches!(
        ScoutConfig::load(&garbled),
        Err(ConfigError::Parse { .. })
    ));
}
