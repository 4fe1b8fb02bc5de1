//! JSON API handlers.

use axum::{extract::State, Json};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::app::App;
use crate::server::auth::Authenticated;
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, ApiQuery};
use crate::types::account::LoginRequest;
use crate::types::bookmark::{Bookmark, BookmarkPatch, NewBookmark, SearchQuery, Tag};
use crate::types::errors::BookmarkError;

/// Query string of `GET /api/bookmarks`. `tags` is space or comma separated.
#[derive(Debug, Default, Deserialize)]
pub struct BookmarkQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub tags: String,
}

impl BookmarkQuery {
    fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// `POST /api/login`: returns the signed token as plain text.
pub async fn login(State(app): State<Arc<App>>, ApiJson(request): ApiJson<LoginRequest>) -> Result<String, ApiError> {
    // PBKDF2 verification blocks, so it runs on the blocking pool.
    let token = tokio::task::spawn_blocking(move || app.tokens.login(&request, App::now()))
        .await
        .map_err(|e| ApiError::Internal(format!("login task failed: {}", e)))??;
    Ok(token)
}

/// `GET /api/bookmarks?keyword=&tags=`
pub async fn list_bookmarks(
    _auth: Authenticated,
    State(app): State<Arc<App>>,
    ApiQuery(query): ApiQuery<BookmarkQuery>,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let search = SearchQuery {
        keyword: query.keyword.clone(),
        tags: query.tag_list(),
        with_content: false,
    };
    Ok(Json(app.search.search(&search)?))
}

/// `GET /api/tags`
pub async fn list_tags(_auth: Authenticated, State(app): State<Arc<App>>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(app.store.get_tags()?))
}

/// `POST /api/bookmarks`: saves a bookmark, fetching its page.
pub async fn create_bookmark(
    _auth: Authenticated,
    State(app): State<Arc<App>>,
    ApiJson(request): ApiJson<Bookmark>,
) -> Result<Json<Bookmark>, ApiError> {
    let new = NewBookmark {
        url: request.url,
        title: request.title,
        excerpt: request.excerpt,
        tags: request.tags.into_iter().map(|t| t.name).collect(),
    };
    let created = app.lifecycle.create(new, false).await?;
    Ok(Json(created))
}

/// `PUT /api/bookmarks[?dont-overwrite]`: updates the bookmark named by `id`.
pub async fn update_bookmark(
    _auth: Authenticated,
    State(app): State<Arc<App>>,
    ApiQuery(params): ApiQuery<HashMap<String, String>>,
    ApiJson(request): ApiJson<Bookmark>,
) -> Result<Json<Bookmark>, ApiError> {
    let overwrite = !params.contains_key("dont-overwrite");
    let patch = BookmarkPatch::from(&request);
    let indices = vec![request.id.to_string()];

    let mut updated = app.lifecycle.update(&indices, &patch, false, overwrite).await?;
    if updated.is_empty() {
        return Err(BookmarkError::NotFound(request.id.to_string()).into());
    }
    Ok(Json(updated.remove(0)))
}

/// `DELETE /api/bookmarks`: body is an array of index strings, echoed back.
pub async fn delete_bookmarks(
    _auth: Authenticated,
    State(app): State<Arc<App>>,
    ApiJson(indices): ApiJson<Vec<String>>,
) -> Result<Json<Vec<String>>, ApiError> {
    app.lifecycle.delete(&indices)?;
    Ok(Json(indices))
}
