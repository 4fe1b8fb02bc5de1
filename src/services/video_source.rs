//! Resolves video pages into downloadable encodings.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;

use crate::types::errors::DownloadError;
use crate::types::video::{VideoFormat, VideoInfo};

/// Container the attachment handler downloads.
pub const TARGET_EXTENSION: &str = "mp4";

/// Turns a video page URL into a title and a list of encodings.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<VideoInfo, DownloadError>;
}

/// Video source backed by the `yt-dlp` binary.
pub struct YtDlpSource {
    binary: String,
    timeout: Duration,
}

impl YtDlpSource {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }
}

/// Subset of the `--dump-single-json` payload.
#[derive(Deserialize)]
struct DumpJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    formats: Vec<DumpFormat>,
}

#[derive(Deserialize)]
struct DumpFormat {
    #[serde(default)]
    url: String,
    #[serde(default)]
    ext: String,
    acodec: Option<String>,
    vcodec: Option<String>,
    height: Option<u32>,
}

impl DumpFormat {
    fn has_codec(codec: &Option<String>) -> bool {
        matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
    }
}

/// Parses `yt-dlp --dump-single-json` output.
pub fn parse_dump(json: &[u8]) -> Result<VideoInfo, DownloadError> {
    let dump: DumpJson =
        serde_json::from_slice(json).map_err(|e| DownloadError::ResolveFailed(e.to_string()))?;
    let formats = dump
        .formats
        .into_iter()
        .filter(|f| !f.url.is_empty())
        .map(|f| VideoFormat {
            has_audio: DumpFormat::has_codec(&f.acodec),
            has_video: DumpFormat::has_codec(&f.vcodec),
            height: f.height.unwrap_or(0),
            url: f.url,
            ext: f.ext,
        })
        .collect();
    Ok(VideoInfo { title: dump.title, formats })
}

/// Picks the highest-resolution encoding with both audio and video in `ext`.
pub fn select_best_format<'a>(formats: &'a [VideoFormat], ext: &str) -> Option<&'a VideoFormat> {
    formats
        .iter()
        .filter(|f| f.has_audio && f.has_video && f.ext.eq_ignore_ascii_case(ext))
        .max_by_key(|f| f.height)
}

#[async_trait]
impl VideoSource for YtDlpSource {
    async fn resolve(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--no-progress")
            .arg(url)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| DownloadError::ResolveFailed(format!("{} timed out for {}", self.binary, url)))?
            .map_err(|e| DownloadError::ResolveFailed(format!("running {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(DownloadError::ResolveFailed(format!(
                "{} failed for {} (status {})",
                self.binary, url, output.status
            )));
        }
        parse_dump(&output.stdout)
    }
}
