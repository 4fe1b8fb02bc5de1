//! Keyword and tag filtering over stored bookmarks.

use std::sync::Arc;

use crate::managers::bookmark_manager::BookmarkStore;
use crate::types::bookmark::{Bookmark, SearchQuery};
use crate::types::errors::BookmarkError;

pub struct SearchEngine {
    store: Arc<dyn BookmarkStore>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    /// Returns matching bookmarks, most recently modified first.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Bookmark>, BookmarkError> {
        // Content is always loaded so the keyword can match it.
        let all = self.store.get_bookmarks(true, &[])?;
        Ok(filter(all, query))
    }
}

/// Applies `query` to `books`, keeping their order.
pub fn filter(books: Vec<Bookmark>, query: &SearchQuery) -> Vec<Bookmark> {
    let keyword = query.keyword.trim().to_lowercase();
    let tags: Vec<&str> = query
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    books
        .into_iter()
        .filter(|book| matches(book, &keyword, &tags))
        .map(|mut book| {
            if !query.with_content {
                book.content.clear();
                book.html.clear();
            }
            book
        })
        .collect()
}

/// `keyword` must already be lowercased.
fn matches(book: &Bookmark, keyword: &str, tags: &[&str]) -> bool {
    let keyword_ok = keyword.is_empty()
        || book.title.to_lowercase().contains(keyword)
        || book.excerpt.to_lowercase().contains(keyword)
        || book.content.to_lowercase().contains(keyword);

    keyword_ok && tags.iter().all(|tag| book.has_tag(tag))
}
