//! Bookmark store for linkshelf.
//!
//! Implements `BookmarkStore`: persistence of bookmarks, their tag
//! associations, and attached videos, backed by SQLite via `rusqlite`.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::database::Database;
use crate::types::bookmark::{Bookmark, Tag};
use crate::types::errors::BookmarkError;
use crate::types::video::Video;

const BOOKMARK_COLUMNS: &str = "id, url, title, image_url, excerpt, author, min_read_time, \
     max_read_time, content, html, is_video, downloaded, modified";

/// Persistence operations the lifecycle manager and HTTP layer rely on.
pub trait BookmarkStore: Send + Sync {
    /// Inserts a bookmark with its tags. Returns the assigned identifier.
    fn create_bookmark(&self, book: &Bookmark) -> Result<i64, BookmarkError>;
    /// Fetches bookmarks by id, newest first. An empty `ids` slice fetches all.
    fn get_bookmarks(&self, with_content: bool, ids: &[i64]) -> Result<Vec<Bookmark>, BookmarkError>;
    /// Writes every bookmark in one transaction and returns the stored rows in input order.
    fn update_bookmarks(&self, books: &[Bookmark]) -> Result<Vec<Bookmark>, BookmarkError>;
    /// Removes bookmarks by id. Returns how many rows were deleted.
    fn delete_bookmarks(&self, ids: &[i64]) -> Result<usize, BookmarkError>;
    /// Lists tags still linked to at least one bookmark, with counts.
    fn get_tags(&self) -> Result<Vec<Tag>, BookmarkError>;
    /// Records the media file of a bookmark, replacing any previous one.
    fn attach_video(&self, video: &Video) -> Result<Video, BookmarkError>;
    fn get_video(&self, bookmark_id: i64) -> Result<Option<Video>, BookmarkError>;
}

/// Bookmark store backed by the shared SQLite database.
pub struct BookmarkManager {
    db: Arc<Database>,
}

impl BookmarkManager {
    /// Creates a new `BookmarkManager` using the provided database.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Reads a single bookmark row into a struct. Tags are attached separately.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            image_url: row.get(3)?,
            excerpt: row.get(4)?,
            author: row.get(5)?,
            min_read_time: row.get(6)?,
            max_read_time: row.get(7)?,
            content: row.get(8)?,
            html: row.get(9)?,
            is_video: row.get(10)?,
            downloaded: row.get(11)?,
            modified: row.get(12)?,
            tags: Vec::new(),
        })
    }

    fn row_to_video(row: &rusqlite::Row) -> rusqlite::Result<Video> {
        Ok(Video {
            id: row.get(0)?,
            bookmark_id: row.get(1)?,
            filename: row.get(2)?,
            downloaded: row.get(3)?,
        })
    }

    /// Applies the tag list of `book`: tombstoned tags are unlinked, the rest
    /// are created if needed and linked.
    fn sync_tags(conn: &Connection, bookmark_id: i64, tags: &[Tag]) -> Result<(), BookmarkError> {
        for tag in tags {
            let name = tag.name.trim();
            if name.is_empty() {
                continue;
            }

            if tag.deleted {
                conn.execute(
                    "DELETE FROM bookmark_tag WHERE bookmark_id = ?1 \
                     AND tag_id = (SELECT id FROM tag WHERE name = ?2)",
                    params![bookmark_id, name],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
                continue;
            }

            conn.execute(
                "INSERT INTO tag (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                params![name],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            let tag_id: i64 = conn
                .query_row("SELECT id FROM tag WHERE name = ?1", params![name], |row| row.get(0))
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
            conn.execute(
                "INSERT OR IGNORE INTO bookmark_tag (bookmark_id, tag_id) VALUES (?1, ?2)",
                params![bookmark_id, tag_id],
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    fn load_tags(conn: &Connection, bookmark_id: i64) -> Result<Vec<Tag>, BookmarkError> {
        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.name FROM tag t \
                 JOIN bookmark_tag bt ON bt.tag_id = t.id \
                 WHERE bt.bookmark_id = ?1 ORDER BY t.name",
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let tags = stmt
            .query_map(params![bookmark_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    ..Tag::default()
                })
            })
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        Ok(tags)
    }

    fn select_bookmarks(
        conn: &Connection,
        with_content: bool,
        ids: &[i64],
    ) -> Result<Vec<Bookmark>, BookmarkError> {
        let sql = if ids.is_empty() {
            format!("SELECT {} FROM bookmark ORDER BY modified DESC, id DESC", BOOKMARK_COLUMNS)
        } else {
            let placeholders = vec!["?"; ids.len()].join(", ");
            format!(
                "SELECT {} FROM bookmark WHERE id IN ({}) ORDER BY modified DESC, id DESC",
                BOOKMARK_COLUMNS, placeholders
            )
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let mut books = stmt
            .query_map(params_from_iter(ids.iter()), Self::row_to_bookmark)
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

        for book in &mut books {
            book.tags = Self::load_tags(conn, book.id)?;
            if !with_content {
                book.content.clear();
                book.html.clear();
            }
        }
        Ok(books)
    }
}

impl BookmarkStore for BookmarkManager {
    fn create_bookmark(&self, book: &Bookmark) -> Result<i64, BookmarkError> {
        let mut conn = self.db.connection();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO bookmark (url, title, image_url, excerpt, author, min_read_time, \
             max_read_time, content, html, is_video, downloaded, modified) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                book.url,
                book.title,
                book.image_url,
                book.excerpt,
                book.author,
                book.min_read_time,
                book.max_read_time,
                book.content,
                book.html,
                book.is_video,
                book.downloaded,
                Self::now()
            ],
        )
        .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let id = tx.last_insert_rowid();

        Self::sync_tags(&tx, id, &book.tags)?;
        tx.commit()?;
        Ok(id)
    }

    fn get_bookmarks(&self, with_content: bool, ids: &[i64]) -> Result<Vec<Bookmark>, BookmarkError> {
        let conn = self.db.connection();
        Self::select_bookmarks(&conn, with_content, ids)
    }

    fn update_bookmarks(&self, books: &[Bookmark]) -> Result<Vec<Bookmark>, BookmarkError> {
        if books.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.db.connection();
        let tx = conn.transaction()?;
        let now = Self::now();

        for book in books {
            let affected = tx
                .execute(
                    "UPDATE bookmark SET url = ?1, title = ?2, image_url = ?3, excerpt = ?4, \
                     author = ?5, min_read_time = ?6, max_read_time = ?7, content = ?8, \
                     html = ?9, is_video = ?10, downloaded = ?11, modified = ?12 WHERE id = ?13",
                    params![
                        book.url,
                        book.title,
                        book.image_url,
                        book.excerpt,
                        book.author,
                        book.min_read_time,
                        book.max_read_time,
                        book.content,
                        book.html,
                        book.is_video,
                        book.downloaded,
                        now,
                        book.id
                    ],
                )
                .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;

            // Dropping `tx` rolls back everything written so far.
            if affected == 0 {
                return Err(BookmarkError::NotFound(book.id.to_string()));
            }
            Self::sync_tags(&tx, book.id, &book.tags)?;
        }

        let ids: Vec<i64> = books.iter().map(|b| b.id).collect();
        let stored = Self::select_bookmarks(&tx, true, &ids)?;
        tx.commit()?;

        let ordered = ids
            .iter()
            .filter_map(|id| stored.iter().find(|b| b.id == *id).cloned())
            .collect();
        Ok(ordered)
    }

    fn delete_bookmarks(&self, ids: &[i64]) -> Result<usize, BookmarkError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.db.connection();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let affected = conn
            .execute(
                &format!("DELETE FROM bookmark WHERE id IN ({})", placeholders),
                params_from_iter(ids.iter()),
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        Ok(affected)
    }

    fn get_tags(&self) -> Result<Vec<Tag>, BookmarkError> {
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT t.id, t.name, COUNT(bt.bookmark_id) FROM tag t \
                 JOIN bookmark_tag bt ON bt.tag_id = t.id \
                 GROUP BY t.id, t.name ORDER BY t.name",
            )
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    n_bookmarks: row.get(2)?,
                    deleted: false,
                })
            })
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BookmarkError::DatabaseError(e.to_string()))?;
        Ok(tags)
    }

    fn attach_video(&self, video: &Video) -> Result<Video, BookmarkError> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO video (bookmark_id, filename, downloaded) VALUES (?1, ?2, ?3) \
             ON CONFLICT(bookmark_id) DO UPDATE SET \
             filename = excluded.filename, downloaded = excluded.downloaded",
            params![video.bookmark_id, video.filename, video.downloaded],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                BookmarkError::NotFound(video.bookmark_id.to_string())
            }
            other => BookmarkError::DatabaseError(other.to_string()),
        })?;

        conn.query_row(
            "SELECT id, bookmark_id, filename, downloaded FROM video WHERE bookmark_id = ?1",
            params![video.bookmark_id],
            Self::row_to_video,
        )
        .map_err(|e| BookmarkError::DatabaseError(e.to_string()))
    }

    fn get_video(&self, bookmark_id: i64) -> Result<Option<Video>, BookmarkError> {
        let conn = self.db.connection();
        conn.query_row(
            "SELECT id, bookmark_id, filename, downloaded FROM video WHERE bookmark_id = ?1",
            params![bookmark_id],
            Self::row_to_video,
        )
        .optional()
        .map_err(|e| BookmarkError::DatabaseError(e.to_string()))
    }
}
