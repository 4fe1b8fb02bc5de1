use serde::{Deserialize, Serialize};

/// A media file cached for a video bookmark. One per bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    #[serde(rename = "bookmarkId")]
    pub bookmark_id: i64,
    /// Path relative to the media directory.
    pub filename: String,
    pub downloaded: bool,
}

/// One encoding offered by a video host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFormat {
    pub url: String,
    /// Container extension, e.g. `mp4` or `webm`.
    pub ext: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Vertical resolution in pixels, 0 when unknown.
    pub height: u32,
}

/// Resolved description of a video page.
#[derive(Debug, Clone, Default)]
pub struct VideoInfo {
    pub title: String,
    pub formats: Vec<VideoFormat>,
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedVideo {
    pub filename: String,
    pub bytes: u64,
}
