use serde::{Deserialize, Serialize};

/// A tag attached to one or more bookmarks.
///
/// `deleted` never leaves the process: it marks a tag that an update should
/// unlink from its bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(rename = "nBookmarks", default)]
    pub n_bookmarks: i64,
    #[serde(skip)]
    pub deleted: bool,
}

impl Tag {
    /// Creates an unsaved tag with a trimmed name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            ..Self::default()
        }
    }

    /// Creates a tombstone telling the store to unlink `name`.
    pub fn removal(name: &str) -> Self {
        Self {
            deleted: true,
            ..Self::named(name)
        }
    }
}

/// A saved URL together with its extracted metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "imageURL", default)]
    pub image_url: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub min_read_time: i64,
    #[serde(default)]
    pub max_read_time: i64,
    /// Last modification time, UNIX seconds. Assigned by the store.
    #[serde(default)]
    pub modified: i64,
    /// Plain article text. Never serialized.
    #[serde(skip)]
    pub content: String,
    /// Article HTML, or a player fragment for video bookmarks. Never serialized.
    #[serde(skip)]
    pub html: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub downloaded: bool,
}

impl Bookmark {
    /// Returns the names of tags that are linked (not tombstoned).
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| !t.deleted)
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Returns true when the bookmark carries a live tag named `name`.
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| !t.deleted && t.name == name)
    }
}

/// Fields a caller may supply when creating a bookmark.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBookmark {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Patch applied by a batch update. Empty strings mean "not supplied".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkPatch {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Bookmark> for BookmarkPatch {
    fn from(book: &Bookmark) -> Self {
        Self {
            url: book.url.clone(),
            title: book.title.clone(),
            excerpt: book.excerpt.clone(),
            tags: book.tags.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

/// Keyword and tag filter for listing bookmarks.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub keyword: String,
    pub tags: Vec<String>,
    pub with_content: bool,
}
