//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, value persistence, validation and reset.

use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait, PORT_ENV};
use linkshelf::types::errors::SettingsError;
use linkshelf::types::settings::ServerSettings;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    SettingsEngine::new(Some(dir.path().join("config.json")))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, ServerSettings::default());
    assert_eq!(settings.port, 8080);
    assert!(!engine.get_config_path().exists(), "Loading must not create the file");
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value("port", serde_json::json!(9000)).unwrap();
        engine
            .set_value("video_hosts", serde_json::json!(["vimeo.com"]))
            .unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let loaded = engine.load().unwrap();
    assert_eq!(loaded.port, 9000);
    assert_eq!(loaded.video_hosts, vec!["vimeo.com".to_string()]);
}

#[test]
fn test_set_value_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let result = engine.set_value("no_such_setting", serde_json::json!(1));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));

    let result = engine.set_value("", serde_json::json!(1));
    assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_set_value_rejects_wrong_type_and_invalid_values() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(engine.set_value("port", serde_json::json!("eighty")).is_err());
    assert!(engine.set_value("port", serde_json::json!(0)).is_err());
    assert!(engine.set_value("extractor_timeout_secs", serde_json::json!(0)).is_err());
    assert!(engine.set_value("yt_dlp_path", serde_json::json!("  ")).is_err());

    assert_eq!(engine.get_settings().port, 8080, "Rejected values must not be applied");
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine.set_value("log_filter", serde_json::json!("debug")).unwrap();
        engine.reset().unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let loaded = engine.load().unwrap();
    assert_eq!(loaded.log_filter, "info");
}

#[test]
fn test_partial_config_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), r#"{ "port": 3000 }"#).unwrap();

    let mut engine = engine_in_temp(&dir);
    let loaded = engine.load().unwrap();

    assert_eq!(loaded.port, 3000);
    assert_eq!(loaded.yt_dlp_path, "yt-dlp");
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    let mut engine = engine_in_temp(&dir);
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b").join("config.json");
    let mut engine = SettingsEngine::new(Some(nested.clone()));
    engine.load().unwrap();

    engine.save().unwrap();
    assert!(nested.exists());
}

#[test]
fn test_paths_derive_from_data_dir() {
    let settings = ServerSettings {
        data_dir: PathBuf::from("/srv/shelf"),
        ..ServerSettings::default()
    };
    assert_eq!(settings.database_path(), PathBuf::from("/srv/shelf/linkshelf.db"));
    assert_eq!(settings.media_path(), PathBuf::from("/srv/shelf/videos"));

    let absolute = ServerSettings {
        media_dir: PathBuf::from("/mnt/media"),
        ..settings
    };
    assert_eq!(absolute.media_path(), PathBuf::from("/mnt/media"));
}

/// The only test in this binary that touches the process environment.
#[test]
fn test_port_env_override() {
    let mut settings = ServerSettings::default();

    std::env::set_var(PORT_ENV, "9123");
    let applied = SettingsEngine::apply_env_overrides(&mut settings);
    assert!(applied.is_ok());
    assert_eq!(settings.port, 9123);

    std::env::set_var(PORT_ENV, "not-a-port");
    let rejected = SettingsEngine::apply_env_overrides(&mut settings);
    std::env::remove_var(PORT_ENV);

    assert!(matches!(rejected, Err(SettingsError::InvalidValue(_))));
}
