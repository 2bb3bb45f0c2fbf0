use super::data::{path_display, Config};
use super::io::ConfigError;
use crate::core::failover::SkipPolicy;
use crate::ui::theme::ThemeColor;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");

    assert_eq!(config, Config::default());
}

#[test]
fn defaults_match_documented_settings() {
    let config = Config::default();
    assert_eq!(config.base_url(), "https://api.deepseek.com/v1");
    assert_eq!(config.model(), "deepseek-chat");
    assert_eq!(config.temperature().expect("temperature"), 0.7);
    assert_eq!(config.preferred_credential(3), 1);
    assert_eq!(config.last_good_credential(3), 1);
    assert_eq!(config.reserved_credential(), Some(0));
    assert_eq!(config.theme_color().expect("theme"), ThemeColor::Yellow);
    assert_eq!(config.failover_policy().expect("policy"), SkipPolicy::Preferred);
    assert_eq!(config.request_timeout(), Duration::from_secs(120));
}

#[test]
fn test_config_persistence_lifecycle() {
    // Save, modify, and unset values across reloads
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        model: Some("deepseek-reasoner".to_string()),
        theme: Some("purple".to_string()),
        credential_slots: vec!["primary".to_string(), "backup".to_string()],
        ..Default::default()
    };
    config
        .save_to_path(&config_path)
        .expect("Failed to save config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(loaded, config);

    let mut config = loaded;
    config.model = None;
    config.remove_credential_slot("PRIMARY");
    config
        .save_to_path(&config_path)
        .expect("Failed to save modified config");
    let loaded = Config::load_from_path(&config_path).expect("Failed to load modified config");
    assert_eq!(loaded.model(), "deepseek-chat");
    assert_eq!(loaded.credential_slots, vec!["backup".to_string()]);
    assert_eq!(loaded.theme.as_deref(), Some("purple"));
}

#[test]
fn parses_hand_written_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
base_url = "https://llm.example.com/v1/"
temperature = 0.3
preferred_credential = 3
reserve_emergency_credential = false
failover_skip = "last-good"
credential_slots = ["a", "b", "c", "d"]
"#,
    )
    .expect("write config");

    let config = Config::load_from_path(&config_path).expect("load");
    assert_eq!(config.base_url(), "https://llm.example.com/v1/");
    assert_eq!(config.temperature().expect("temperature"), 0.3);
    assert_eq!(config.preferred_credential(4), 3);
    assert_eq!(config.reserved_credential(), None);
    assert_eq!(config.failover_policy().expect("policy"), SkipPolicy::LastGood);
    assert_eq!(config.credential_slots.len(), 4);
}

#[test]
fn default_indices_shrink_for_a_single_credential() {
    let config = Config::default();
    assert_eq!(config.preferred_credential(1), 0);
    assert_eq!(config.last_good_credential(1), 0);

    let explicit = Config {
        preferred_credential: Some(2),
        ..Config::default()
    };
    assert_eq!(explicit.preferred_credential(1), 2);
}

#[test]
fn invalid_toml_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "temperature = [").expect("write config");

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("is not valid"));
}

#[test]
fn out_of_range_values_are_rejected() {
    let config = Config {
        temperature: Some(1.5),
        theme: Some("green".to_string()),
        failover_skip: Some("random".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        config.temperature(),
        Err(ConfigError::Invalid {
            field: "temperature",
            ..
        })
    ));
    assert!(config.theme_color().is_err());
    assert!(config.failover_policy().is_err());
}

#[test]
fn credential_slots_are_unique_case_insensitively() {
    let mut config = Config::default();
    assert!(config.add_credential_slot("Primary"));
    assert!(!config.add_credential_slot("primary"));
    assert!(config.has_credential_slot("PRIMARY"));
    assert!(config.remove_credential_slot("primary"));
    assert!(!config.remove_credential_slot("primary"));
}

#[cfg(unix)]
#[test]
fn path_display_abbreviates_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let path = std::path::PathBuf::from(home).join(".config/purrchat");
        assert_eq!(path_display(&path), "~/.config/purrchat");
    }
}
