use super::*;
use crate::cli::commands::schedule;
use farmkonnect_core::retry::RetryPolicy;
use std::path::Path;

#[test]
fn cli_parse_backoff() {
    match parse(&["farmkonnect", "backoff"]).command {
        CliCommand::Backoff { attempts } => assert!(attempts.is_none()),
        _ => panic!("expected Backoff"),
    }
    match parse(&["farmkonnect", "backoff", "--attempts", "6"]).command {
        CliCommand::Backoff { attempts } => assert_eq!(attempts, Some(6)),
        _ => panic!("expected Backoff"),
    }
}

#[test]
fn cli_parse_config_with_global_flags() {
    let cli = parse(&[
        "farmkonnect",
        "config",
        "--config",
        "/tmp/fk.toml",
        "--base-url",
        "http://farm.local",
    ]);
    assert!(matches!(cli.command, CliCommand::Config));
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/fk.toml")));
    assert_eq!(cli.base_url.as_deref(), Some("http://farm.local"));
}

#[test]
fn base_url_override_applies_to_loaded_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "base_url = \"http://a\"\ntimeout_secs = 3\n").unwrap();
    let path_str = path.to_str().unwrap();

    let cli = parse(&["farmkonnect", "--config", path_str, "config"]);
    assert_eq!(cli.load_config().unwrap().base_url, "http://a");

    let cli = parse(&["farmkonnect", "--config", path_str, "--base-url", "http://b", "config"]);
    let cfg = cli.load_config().unwrap();
    assert_eq!(cfg.base_url, "http://b");
    assert_eq!(cfg.timeout_secs, 3);
}

#[test]
fn backoff_schedule_for_default_policy() {
    let rows = schedule(&RetryPolicy::default(), 6);
    assert_eq!(rows[0], (1, 1000, 1100));
    assert_eq!(rows[1], (2, 2000, 2200));
    assert_eq!(rows[4], (5, 16_000, 17_600));
    // Capped at max_delay; jitter has no headroom left.
    assert_eq!(rows[5], (6, 30_000, 30_000));
}
