use serde::{Deserialize, Serialize};

/// Article metadata and content returned by a content extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleContent {
    /// Final URL after redirects.
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub image_url: String,
    pub min_read_time: i64,
    pub max_read_time: i64,
    /// Plain text content.
    pub content: String,
    /// Cleaned article HTML.
    pub raw_content: String,
}

/// How a reconciliation pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Network access was skipped on request.
    Offline,
    /// Extractor metadata was merged.
    Fetched,
    /// The extractor failed; offline rules were applied instead.
    Degraded(String),
}
