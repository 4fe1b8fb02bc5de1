// linkshelf Settings Engine
// Loads server settings from a JSON file, applies environment overrides,
// and persists edits made through `linkshelf config`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::ServerSettings;

/// Overrides the listening port.
pub const PORT_ENV: &str = "LINKSHELF_PORT";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ServerSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ServerSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: PathBuf,
    settings: ServerSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses `config.json` in the platform config directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("config.json"));

        Self {
            config_path,
            settings: ServerSettings::default(),
        }
    }

    /// Applies `LINKSHELF_DATA_DIR` and `LINKSHELF_PORT` on top of `settings`.
    pub fn apply_env_overrides(settings: &mut ServerSettings) -> Result<(), SettingsError> {
        if let Ok(dir) = std::env::var(platform::DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                settings.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            if !port.trim().is_empty() {
                settings.port = port.trim().parse().map_err(|_| {
                    SettingsError::InvalidValue(format!("{} must be a port number, got {:?}", PORT_ENV, port))
                })?;
            }
        }
        Ok(())
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(settings: &ServerSettings) -> Result<(), SettingsError> {
        if settings.port == 0 {
            return Err(SettingsError::InvalidValue("port must not be 0".to_string()));
        }
        if settings.extractor_timeout_secs == 0 || settings.download_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue("timeouts must be at least 1 second".to_string()));
        }
        if settings.yt_dlp_path.trim().is_empty() {
            return Err(SettingsError::InvalidValue("yt_dlp_path must not be empty".to_string()));
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<ServerSettings, SettingsError> {
        let path = self.config_path.as_path();

        if !path.exists() {
            self.settings = ServerSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: ServerSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Self::validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = self.config_path.as_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Updates one top-level setting and saves the file.
    ///
    /// Round-trips the settings through `serde_json::Value` so the new value
    /// goes through the same deserialization as the file itself.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidValue("Key cannot be empty".to_string()));
        }

        let mut root = serde_json::to_value(&self.settings)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
        let fields = root
            .as_object_mut()
            .ok_or_else(|| SettingsError::SerializationError("settings are not an object".to_string()))?;
        if !fields.contains_key(key) {
            return Err(SettingsError::InvalidValue(format!("Unknown setting: {}", key)));
        }
        fields.insert(key.to_string(), value);

        let updated: ServerSettings = serde_json::from_value(root)
            .map_err(|e| SettingsError::InvalidValue(format!("Invalid value for {}: {}", key, e)))?;
        Self::validate(&updated)?;

        self.settings = updated;
        self.save()
    }

    /// Restores defaults and saves them.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = ServerSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
