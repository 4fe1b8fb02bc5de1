//! Bookmark lifecycle for linkshelf.
//!
//! Create, update and delete as seen by the CLI and the HTTP API. Every
//! entry point validates its whole input before touching the store.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::managers::bookmark_manager::BookmarkStore;
use crate::managers::download_manager::VideoAttacher;
use crate::services::metadata_reconciler::{apply_placeholder, merge_article, MetadataReconciler};
use crate::services::url_normalizer;
use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark, Tag};
use crate::types::errors::BookmarkError;
use crate::types::reader::ReconcileOutcome;

pub struct LifecycleManager {
    store: Arc<dyn BookmarkStore>,
    reconciler: MetadataReconciler,
    attacher: VideoAttacher,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn BookmarkStore>, reconciler: MetadataReconciler, attacher: VideoAttacher) -> Self {
        Self { store, reconciler, attacher }
    }

    pub fn store(&self) -> &Arc<dyn BookmarkStore> {
        &self.store
    }

    pub fn attacher(&self) -> &VideoAttacher {
        &self.attacher
    }

    /// Saves a new bookmark and returns it as stored.
    pub async fn create(&self, request: NewBookmark, offline: bool) -> Result<Bookmark, BookmarkError> {
        let url = url_normalizer::normalize(&request.url)?;

        let mut book = Bookmark {
            url,
            title: request.title.trim().to_string(),
            excerpt: request.excerpt.trim().to_string(),
            tags: dedup_tags(request.tags.iter().map(|t| Tag::named(t))),
            ..Bookmark::default()
        };
        let outcome = self.reconciler.reconcile(&mut book, offline).await;

        let id = self.store.create_bookmark(&book)?;
        let mut stored = self.load_one(id)?;
        match &outcome {
            ReconcileOutcome::Degraded(reason) => {
                warn!(id, url = %stored.url, reason = %reason, "Created bookmark without page metadata")
            }
            _ => info!(id, url = %stored.url, ?outcome, "Created bookmark"),
        }

        if self.attacher.is_video_url(&stored.url) {
            stored = self.attacher.attach(self.store.as_ref(), stored).await?;
        }
        Ok(stored)
    }

    /// Applies `patch` to every bookmark named in `indices`.
    ///
    /// With `overwrite`, title, excerpt and tags are replaced outright;
    /// otherwise only non-empty patch fields apply and `-name` tags remove.
    pub async fn update(
        &self,
        indices: &[String],
        patch: &BookmarkPatch,
        offline: bool,
        overwrite: bool,
    ) -> Result<Vec<Bookmark>, BookmarkError> {
        let ids = parse_indices(indices)?;

        let new_url = if patch.url.trim().is_empty() {
            None
        } else {
            if ids.len() > 1 {
                return Err(BookmarkError::InvalidUrl(
                    "one URL cannot be applied to several bookmarks".to_string(),
                ));
            }
            Some(url_normalizer::normalize(&patch.url)?)
        };

        let found = self.store.get_bookmarks(true, &ids)?;
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !found.iter().any(|b| b.id == **id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(BookmarkError::NotFound(missing.join(", ")));
        }

        let by_id: HashMap<i64, Bookmark> = found.into_iter().map(|b| (b.id, b)).collect();
        let mut pending = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(stored) = by_id.get(id) else {
                continue;
            };
            let mut book = apply_patch(stored, patch, new_url.as_deref(), overwrite);
            if !offline {
                // `apply_patch` already settled title and excerpt for the
                // chosen mode; the page only fills what is still blank.
                if let Ok(article) = self.reconciler.fetch(&book.url).await {
                    merge_article(&mut book, article);
                }
            }
            apply_placeholder(&mut book);
            pending.push(book);
        }

        let updated = self.store.update_bookmarks(&pending)?;
        info!(count = updated.len(), "Updated bookmarks");
        Ok(updated)
    }

    /// Removes bookmarks by index. Indices with no bookmark are ignored.
    /// Returns the identifiers that were requested.
    pub fn delete(&self, indices: &[String]) -> Result<Vec<i64>, BookmarkError> {
        let ids = parse_indices(indices)?;
        let removed = self.store.delete_bookmarks(&ids)?;
        info!(requested = ids.len(), removed, "Deleted bookmarks");
        Ok(ids)
    }

    fn load_one(&self, id: i64) -> Result<Bookmark, BookmarkError> {
        self.store
            .get_bookmarks(true, &[id])?
            .into_iter()
            .next()
            .ok_or_else(|| BookmarkError::NotFound(id.to_string()))
    }
}

/// Parses every index as a non-negative integer, failing on the first bad one.
/// Duplicates collapse to their first occurrence.
pub fn parse_indices(indices: &[String]) -> Result<Vec<i64>, BookmarkError> {
    if indices.is_empty() {
        return Err(BookmarkError::InvalidIndex("no index given".to_string()));
    }

    let mut ids = Vec::with_capacity(indices.len());
    for raw in indices {
        let id = raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= 0)
            .ok_or_else(|| BookmarkError::InvalidIndex(raw.clone()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Builds the next version of `stored` from a patch, before reconciliation.
fn apply_patch(stored: &Bookmark, patch: &BookmarkPatch, new_url: Option<&str>, overwrite: bool) -> Bookmark {
    let mut book = stored.clone();
    if let Some(url) = new_url {
        book.url = url.to_string();
    }

    if overwrite {
        book.title = patch.title.trim().to_string();
        book.excerpt = patch.excerpt.trim().to_string();
    } else {
        if !patch.title.trim().is_empty() {
            book.title = patch.title.trim().to_string();
        }
        if !patch.excerpt.trim().is_empty() {
            book.excerpt = patch.excerpt.trim().to_string();
        }
    }

    book.tags = tag_delta(&stored.tags, &patch.tags, overwrite);
    book
}

/// Computes the tag list sent to the store, tombstones included.
fn tag_delta(current: &[Tag], patch: &[String], overwrite: bool) -> Vec<Tag> {
    let mut result: Vec<Tag> = Vec::new();

    if overwrite {
        let wanted = dedup_tags(patch.iter().map(|t| Tag::named(t.trim_start_matches('-'))));
        for tag in current {
            if !wanted.iter().any(|w| w.name == tag.name) {
                result.push(Tag::removal(&tag.name));
            }
        }
        result.extend(wanted);
        return result;
    }

    result.extend(current.iter().cloned());
    for raw in patch {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix('-') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            result.retain(|t| t.name != name);
            result.push(Tag::removal(name));
        } else if !raw.is_empty() {
            result.retain(|t| t.name != raw);
            result.push(Tag::named(raw));
        }
    }
    result
}

fn dedup_tags(tags: impl Iterator<Item = Tag>) -> Vec<Tag> {
    let mut out: Vec<Tag> = Vec::new();
    for tag in tags {
        if !tag.name.is_empty() && !out.iter().any(|t| t.name == tag.name) {
            out.push(tag);
        }
    }
    out
}
