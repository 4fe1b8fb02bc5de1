//! Browser-facing routes: the app shell, the login page, cached bookmark
//! pages and downloaded videos.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use crate::app::App;
use crate::server::error::ApiError;
use crate::services::reader_mode::format_for_display;
use crate::types::errors::BookmarkError;

const INDEX_HTML: &str = include_str!("assets/index.html");
const LOGIN_HTML: &str = include_str!("assets/login.html");

const STREAM_CHUNK: usize = 64 * 1024;

fn has_session(app: &App, headers: &HeaderMap) -> bool {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    app.tokens.validate_session_cookie(cookie, App::now()).is_ok()
}

/// Temporary redirect that browsers and proxies must not cache, since the
/// target depends on the session state.
pub fn redirect(location: &'static str) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, HeaderValue::from_static(location)),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate")),
            (header::PRAGMA, HeaderValue::from_static("no-cache")),
            (header::EXPIRES, HeaderValue::from_static("0")),
        ],
    )
        .into_response()
}

/// `GET /`
pub async fn index(State(app): State<Arc<App>>, headers: HeaderMap) -> Response {
    if !has_session(&app, &headers) {
        return redirect("/login");
    }
    Html(INDEX_HTML).into_response()
}

/// `GET /login`
pub async fn login_page(State(app): State<Arc<App>>, headers: HeaderMap) -> Response {
    if has_session(&app, &headers) {
        return redirect("/");
    }
    Html(LOGIN_HTML).into_response()
}

/// `GET /bookmark/{id}`: readable without a session.
pub async fn bookmark_cache(State(app): State<Arc<App>>, Path(id): Path<String>) -> Result<Html<String>, ApiError> {
    let id: i64 = id
        .trim()
        .parse()
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| BookmarkError::NotFound(id.clone()))?;

    let book = app
        .store
        .get_bookmarks(true, &[id])?
        .into_iter()
        .next()
        .ok_or_else(|| BookmarkError::NotFound(id.to_string()))?;

    Ok(Html(format_for_display(&book)))
}

/// `GET /videos/{file}`: streams a file from the media directory.
pub async fn video_file(State(app): State<Arc<App>>, Path(file): Path<String>) -> Result<Response, ApiError> {
    if !is_plain_filename(&file) {
        return Err(BookmarkError::NotFound(file).into());
    }

    let path = app.lifecycle.attacher().media_dir().join(&file);
    let handle = tokio::fs::File::open(&path)
        .await
        .map_err(|_| BookmarkError::NotFound(file.clone()))?;
    let length = handle.metadata().await.map(|m| m.len()).ok();

    let stream = futures_util::stream::try_unfold(handle, |mut handle| async move {
        let mut buf = vec![0u8; STREAM_CHUNK];
        let read = handle.read(&mut buf).await?;
        if read == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(read);
        Ok(Some((Bytes::from(buf), handle)))
    });

    let mut response = Response::new(Body::from_stream(stream));
    let content_type = if file.to_ascii_lowercase().ends_with(".mp4") {
        "video/mp4"
    } else {
        "application/octet-stream"
    };
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Some(length) = length {
        response.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    Ok(response)
}

/// One path segment, not hidden, no separators.
fn is_plain_filename(file: &str) -> bool {
    !file.is_empty()
        && !file.starts_with('.')
        && !file.contains('/')
        && !file.contains('\\')
        && !file.contains('\0')
}
