//! Video attachment for linkshelf.
//!
//! When a bookmark points at a known video host, `VideoAttacher` resolves the
//! page into encodings, streams the best mp4 into the media directory, swaps
//! the bookmark HTML for a player, and records the file in the `video` table.

use futures_util::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::managers::bookmark_manager::BookmarkStore;
use crate::services::reader_mode::escape_html;
use crate::services::video_source::{select_best_format, VideoSource, TARGET_EXTENSION};
use crate::types::bookmark::Bookmark;
use crate::types::errors::{BookmarkError, DownloadError};
use crate::types::video::{DownloadedVideo, Video};

/// URL prefix the HTTP server mounts the media directory under.
pub const MEDIA_ROUTE: &str = "/videos";

const MAX_FILENAME_CHARS: usize = 120;

/// Upper bound on `{stem} (N)` candidates tried for one download.
const MAX_NAME_ATTEMPTS: u32 = 1000;

pub struct VideoAttacher {
    source: Arc<dyn VideoSource>,
    client: reqwest::Client,
    media_dir: PathBuf,
    video_hosts: Vec<String>,
}

impl VideoAttacher {
    pub fn new(
        source: Arc<dyn VideoSource>,
        media_dir: PathBuf,
        video_hosts: Vec<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_default();
        Self {
            source,
            client,
            media_dir,
            video_hosts: video_hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    pub fn media_dir(&self) -> &PathBuf {
        &self.media_dir
    }

    /// Returns true when the URL host is a video host or a subdomain of one.
    pub fn is_video_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.video_hosts
            .iter()
            .any(|known| host == *known || host.ends_with(&format!(".{}", known)))
    }

    /// Resolves and downloads the best encoding for `url`.
    ///
    /// Returns `Ok(None)` when the page cannot be resolved or offers no
    /// acceptable encoding; the bookmark then simply stays without media.
    pub async fn download(&self, url: &str) -> Result<Option<DownloadedVideo>, DownloadError> {
        match self.fetch_media(url).await {
            Ok(downloaded) => Ok(Some(downloaded)),
            Err(err) if err.is_recoverable() => {
                warn!(url = %url, error = %err, "Saving without media");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn fetch_media(&self, url: &str) -> Result<DownloadedVideo, DownloadError> {
        let info = self.source.resolve(url).await?;
        let format = select_best_format(&info.formats, TARGET_EXTENSION)
            .ok_or_else(|| DownloadError::NoSuitableFormat(url.to_string()))?;

        self.ensure_media_dir().await?;

        let stem = sanitize_filename(&info.title);
        let (filename, bytes) = self.stream_to_file(&format.url, &stem).await?;
        info!(url = %url, filename = %filename, bytes, height = format.height, "Downloaded video");

        Ok(DownloadedVideo { filename, bytes })
    }

    /// Downloads media for a stored bookmark and persists the result.
    ///
    /// A bookmark that ends up without media is returned unchanged.
    pub async fn attach(&self, store: &dyn BookmarkStore, book: Bookmark) -> Result<Bookmark, BookmarkError> {
        let downloaded = match self.download(&book.url).await {
            Ok(Some(downloaded)) => downloaded,
            Ok(None) => return Ok(book),
            Err(err) => return Err(BookmarkError::DownloadFailed(err.to_string())),
        };

        let previous = store.get_video(book.id)?;

        let mut book = book;
        book.is_video = true;
        book.downloaded = true;
        book.html = player_fragment(&downloaded.filename);

        let mut updated = store.update_bookmarks(std::slice::from_ref(&book))?;
        store.attach_video(&Video {
            id: 0,
            bookmark_id: book.id,
            filename: downloaded.filename.clone(),
            downloaded: true,
        })?;

        if let Some(previous) = previous.filter(|v| v.filename != downloaded.filename) {
            self.remove_media(&previous.filename).await;
        }

        Ok(updated.pop().unwrap_or(book))
    }

    async fn ensure_media_dir(&self) -> Result<(), DownloadError> {
        match tokio::fs::create_dir_all(&self.media_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(DownloadError::FileSystemError(format!(
                "creating {}: {}",
                self.media_dir.display(),
                e
            ))),
        }
    }

    /// Deletes a media file that no bookmark points at any more.
    async fn remove_media(&self, filename: &str) {
        let path = self.media_dir.join(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(filename = %filename, "Removed replaced video"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(filename = %filename, error = %e, "Failed to remove replaced video"),
        }
    }

    /// Claims `{stem}.mp4`, or `{stem} (N).mp4` when taken, by creating it
    /// exclusively. The empty file is later replaced by the finished download.
    async fn reserve_filename(&self, stem: &str) -> Result<(String, PathBuf), DownloadError> {
        for n in 1..=MAX_NAME_ATTEMPTS {
            let filename = if n == 1 {
                format!("{}.{}", stem, TARGET_EXTENSION)
            } else {
                format!("{} ({}).{}", stem, n, TARGET_EXTENSION)
            };
            let path = self.media_dir.join(&filename);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok((filename, path)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(DownloadError::FileSystemError(format!("{}: {}", path.display(), e))),
            }
        }
        Err(DownloadError::FileSystemError(format!(
            "no free file name for {} after {} attempts",
            stem, MAX_NAME_ATTEMPTS
        )))
    }

    /// Streams `source_url` into a private `.part` file, then moves it onto a
    /// freshly reserved name. Returns the final filename and the byte count.
    async fn stream_to_file(&self, source_url: &str, stem: &str) -> Result<(String, u64), DownloadError> {
        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| DownloadError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadError::NetworkError(format!(
                "media request failed with HTTP {}",
                response.status().as_u16()
            )));
        }

        let part_path = self.media_dir.join(format!(".{}.part", Uuid::new_v4()));

        let mut file = tokio::fs::File::create(&part_path)
            .await
            .map_err(|e| DownloadError::FileSystemError(e.to_string()))?;

        let mut stream = response.bytes_stream();
        let mut total_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&part_path).await;
                    return Err(DownloadError::NetworkError(e.to_string()));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(DownloadError::FileSystemError(e.to_string()));
            }
            total_bytes += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::FileSystemError(e.to_string()))?;
        drop(file);

        let (filename, final_path) = match self.reserve_filename(stem).await {
            Ok(reserved) => reserved,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&part_path, &final_path).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            let _ = tokio::fs::remove_file(&final_path).await;
            return Err(DownloadError::FileSystemError(e.to_string()));
        }

        Ok((filename, total_bytes))
    }
}

/// Builds the embeddable player shown instead of article HTML.
pub fn player_fragment(filename: &str) -> String {
    format!(
        "<video controls preload=\"metadata\" src=\"{}\"></video>",
        escape_html(&media_src(filename))
    )
}

/// Path of `filename` under [`MEDIA_ROUTE`], percent-encoded as one segment.
pub fn media_src(filename: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/") else {
        return format!("{}/{}", MEDIA_ROUTE, filename);
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .clear()
            .push(MEDIA_ROUTE.trim_start_matches('/'))
            .push(filename);
    }
    url.path().to_string()
}

/// Turns a video title into a safe file stem.
pub fn sanitize_filename(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed: String = collapsed
        .trim_matches(|c: char| c == '.' || c == ' ')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed
    }
}
