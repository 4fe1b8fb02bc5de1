//! Merges caller-supplied bookmark fields with extracted page metadata.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::services::reader_mode::ContentExtractor;
use crate::types::bookmark::Bookmark;
use crate::types::errors::FetchError;
use crate::types::reader::{ArticleContent, ReconcileOutcome};

/// Title given to bookmarks when neither the caller nor the page provides one.
pub const UNTITLED: &str = "Untitled";

/// Default bound on a single extractor call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MetadataReconciler {
    extractor: Arc<dyn ContentExtractor>,
    timeout: Duration,
}

impl MetadataReconciler {
    pub fn new(extractor: Arc<dyn ContentExtractor>, timeout: Duration) -> Self {
        Self { extractor, timeout }
    }

    /// Fills `book` from the extractor unless `offline` is set.
    ///
    /// Extractor failures (including the timeout) never fail the call: they
    /// are logged and the offline rules apply.
    pub async fn reconcile(&self, book: &mut Bookmark, offline: bool) -> ReconcileOutcome {
        if offline {
            apply_placeholder(book);
            return ReconcileOutcome::Offline;
        }

        match self.fetch(&book.url).await {
            Ok(article) => {
                merge_article(book, article);
                apply_placeholder(book);
                ReconcileOutcome::Fetched
            }
            Err(err) => {
                apply_placeholder(book);
                ReconcileOutcome::Degraded(err.to_string())
            }
        }
    }

    /// Calls the extractor under the configured time bound. Failures are logged here.
    pub async fn fetch(&self, url: &str) -> Result<ArticleContent, FetchError> {
        let fetched = match tokio::time::timeout(self.timeout, self.extractor.extract(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout.as_secs())),
        };

        match &fetched {
            Ok(article) => debug!(url = %url, canonical = %article.url, "Fetched page metadata"),
            Err(err) => warn!(url = %url, error = %err, "Failed to fetch page metadata, keeping caller fields"),
        }
        fetched
    }
}

/// Applies extractor precedence. Caller title and excerpt win when non-empty.
/// Video bookmarks keep their player fragment.
pub fn merge_article(book: &mut Bookmark, article: ArticleContent) {
    if !article.url.trim().is_empty() {
        book.url = article.url;
    }
    if book.title.trim().is_empty() {
        book.title = article.title;
    }
    if book.excerpt.trim().is_empty() {
        book.excerpt = article.excerpt;
    }
    book.image_url = article.image_url;
    book.author = article.author;
    book.min_read_time = article.min_read_time;
    book.max_read_time = article.max_read_time;
    book.content = article.content;
    if !book.is_video {
        book.html = article.raw_content;
    }
}

/// Gives a blank title the placeholder.
pub fn apply_placeholder(book: &mut Bookmark) {
    if book.title.trim().is_empty() {
        book.title = UNTITLED.to_string();
    }
}
