use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform;

/// Runtime settings for the CLI and the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Media directory, relative to `data_dir` unless absolute.
    pub media_dir: PathBuf,
    pub extractor_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Hosts whose pages are treated as videos. Subdomains match too.
    pub video_hosts: Vec<String>,
    pub yt_dlp_path: String,
    pub log_filter: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            data_dir: platform::get_data_dir(),
            media_dir: PathBuf::from("videos"),
            extractor_timeout_secs: 10,
            download_timeout_secs: 600,
            video_hosts: vec!["youtube.com".to_string(), "youtu.be".to_string()],
            yt_dlp_path: "yt-dlp".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl ServerSettings {
    /// Path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("linkshelf.db")
    }

    /// Absolute (or data-dir relative) media directory.
    pub fn media_path(&self) -> PathBuf {
        if self.media_dir.is_absolute() {
            self.media_dir.clone()
        } else {
            self.data_dir.join(&self.media_dir)
        }
    }
}
