//! HTTP tests for the linkshelf router.
//!
//! Requests go through `tower::ServiceExt::oneshot` against the real router,
//! backed by an in-memory database and stub network collaborators.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use linkshelf::app::App;
use linkshelf::database::Database;
use linkshelf::server;
use linkshelf::services::crypto_service::{CryptoService, CryptoServiceTrait};
use linkshelf::services::reader_mode::ContentExtractor;
use linkshelf::services::video_source::VideoSource;
use linkshelf::types::bookmark::{Bookmark, Tag};
use linkshelf::types::errors::{DownloadError, FetchError};
use linkshelf::types::reader::ArticleContent;
use linkshelf::types::settings::ServerSettings;
use linkshelf::types::video::VideoInfo;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct PageExtractor;

#[async_trait]
impl ContentExtractor for PageExtractor {
    async fn extract(&self, _url: &str) -> Result<ArticleContent, FetchError> {
        Ok(ArticleContent {
            title: "Fetched Title".to_string(),
            excerpt: "Fetched excerpt".to_string(),
            content: "Fetched body".to_string(),
            raw_content: "<p>Fetched body</p><script>alert(1)</script>".to_string(),
            ..ArticleContent::default()
        })
    }
}

struct NoVideo;

#[async_trait]
impl VideoSource for NoVideo {
    async fn resolve(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        Err(DownloadError::ResolveFailed(url.to_string()))
    }
}

struct TestHarness {
    _temp: TempDir,
    app: Arc<App>,
    router: Router,
}

impl TestHarness {
    fn setup() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = ServerSettings {
            data_dir: temp.path().to_path_buf(),
            ..ServerSettings::default()
        };
        let db = Arc::new(Database::open_in_memory().expect("database"));
        let crypto: Arc<dyn CryptoServiceTrait> = Arc::new(CryptoService::with_iterations(1_000));
        let app = App::from_parts(settings, db, Arc::new(PageExtractor), Arc::new(NoVideo), crypto).expect("app");
        app.accounts.create_account("ana", "s3cret").expect("account");

        let app = Arc::new(app);
        let router = server::router(app.clone());
        Self { _temp: temp, app, router }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("router response")
    }

    async fn token(&self) -> String {
        let response = self
            .send(json_request(Method::POST, "/api/login", None, json!({"username": "ana", "password": "s3cret"})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await
    }
}

fn json_request(method: Method, path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get(path: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

fn get_with_cookie(path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::COOKIE, format!("token={}", token))
        .body(Body::empty())
        .expect("request")
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body bytes");
    serde_json::from_slice(&bytes).expect("decode json")
}

fn seed(app: &App, url: &str, title: &str, tags: &[&str]) -> i64 {
    app.store
        .create_bookmark(&Bookmark {
            url: url.to_string(),
            title: title.to_string(),
            html: format!("<p>{}</p>", title),
            tags: tags.iter().map(|t| Tag::named(t)).collect(),
            ..Bookmark::default()
        })
        .expect("seed bookmark")
}

// === Login ===

#[tokio::test]
async fn login_returns_plain_token() {
    let h = TestHarness::setup();
    let token = h.token().await;
    assert_eq!(token.split('.').count(), 3, "Token must be a compact JWT");
}

#[tokio::test]
async fn login_failure_is_unauthorized_json() {
    let h = TestHarness::setup();
    let response = h
        .send(json_request(Method::POST, "/api/login", None, json!({"username": "ana", "password": "wrong"})))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = decode_json(response).await;
    assert_eq!(body["error"], "Username and password don't match");
}

// === Bearer-protected API ===

#[tokio::test]
async fn api_requires_bearer_token() {
    let h = TestHarness::setup();

    for path in ["/api/bookmarks", "/api/tags"] {
        let response = h.send(get(path, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} must need a token", path);
    }

    let response = h.send(get("/api/bookmarks", Some("forged.token.value"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_list_bookmark() {
    let h = TestHarness::setup();
    let token = h.token().await;

    let response = h
        .send(json_request(
            Method::POST,
            "/api/bookmarks",
            Some(&token),
            json!({"url": "https://example.com/post?utm_source=x", "title": "", "tags": [{"name": "rust"}]}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created: Value = decode_json(response).await;
    assert_eq!(created["url"], "https://example.com/post");
    assert_eq!(created["title"], "Fetched Title");
    assert!(created.get("content").is_none(), "Content is never serialized");

    let listed: Vec<Value> = decode_json(h.send(get("/api/bookmarks", Some(&token))).await).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["tags"][0]["name"], "rust");
}

#[tokio::test]
async fn create_with_invalid_url_is_bad_request() {
    let h = TestHarness::setup();
    let token = h.token().await;

    let response = h
        .send(json_request(Method::POST, "/api/bookmarks", Some(&token), json!({"url": "not a url"})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_json_bad_requests() {
    let h = TestHarness::setup();
    let token = h.token().await;

    let wrong_type = json_request(Method::POST, "/api/bookmarks", Some(&token), json!({"url": 42}));
    let not_json = Request::builder()
        .method(Method::DELETE)
        .uri("/api/bookmarks")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from("[1, "))
        .expect("request");
    let no_content_type = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .body(Body::from(r#"{"username": "admin", "password": "pw"}"#))
        .expect("request");

    for request in [wrong_type, not_json, no_content_type] {
        let response = h.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body: Value = decode_json(response).await;
        assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
    }
    assert!(h.app.store.get_bookmarks(false, &[]).unwrap().is_empty());
}

#[tokio::test]
async fn list_filters_by_keyword_and_tags() {
    let h = TestHarness::setup();
    let token = h.token().await;
    seed(&h.app, "https://a.example/", "Rust CLI", &["rust", "cli"]);
    seed(&h.app, "https://b.example/", "Rust web", &["rust", "web"]);

    let both: Vec<Value> = decode_json(h.send(get("/api/bookmarks?tags=rust%20cli", Some(&token))).await).await;
    assert_eq!(both.len(), 1);
    assert_eq!(both[0]["title"], "Rust CLI");

    let keyword: Vec<Value> = decode_json(h.send(get("/api/bookmarks?keyword=WEB", Some(&token))).await).await;
    assert_eq!(keyword.len(), 1);
    assert_eq!(keyword[0]["title"], "Rust web");
}

#[tokio::test]
async fn tags_endpoint_counts_bookmarks() {
    let h = TestHarness::setup();
    let token = h.token().await;
    seed(&h.app, "https://a.example/", "A", &["rust"]);
    seed(&h.app, "https://b.example/", "B", &["rust", "go"]);

    let tags: Vec<Value> = decode_json(h.send(get("/api/tags", Some(&token))).await).await;
    let counts: Vec<(&str, i64)> = tags
        .iter()
        .map(|t| (t["name"].as_str().unwrap(), t["nBookmarks"].as_i64().unwrap()))
        .collect();
    assert_eq!(counts, vec![("go", 1), ("rust", 2)]);
}

#[tokio::test]
async fn update_with_dont_overwrite_merges() {
    let h = TestHarness::setup();
    let token = h.token().await;
    let id = seed(&h.app, "https://a.example/", "Stored", &["go"]);

    let response = h
        .send(json_request(
            Method::PUT,
            "/api/bookmarks?dont-overwrite",
            Some(&token),
            json!({"id": id, "url": "https://a.example/", "excerpt": "Mine", "tags": [{"name": "rust"}]}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = decode_json(response).await;

    // Merge mode keeps the stored title even though the page offers one.
    assert_eq!(updated["title"], "Stored");
    assert_eq!(updated["excerpt"], "Mine");
    let mut tags: Vec<String> = updated["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    tags.sort();
    assert_eq!(tags, vec!["go", "rust"]);
}

#[tokio::test]
async fn update_unknown_or_negative_id() {
    let h = TestHarness::setup();
    let token = h.token().await;

    let missing = h
        .send(json_request(Method::PUT, "/api/bookmarks", Some(&token), json!({"id": 9000, "title": "x"})))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let negative = h
        .send(json_request(Method::PUT, "/api/bookmarks", Some(&token), json!({"id": -1, "title": "x"})))
        .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_echoes_indices() {
    let h = TestHarness::setup();
    let token = h.token().await;
    let id = seed(&h.app, "https://a.example/", "A", &[]);

    let body = json!([id.to_string(), "9000"]);
    let response = h.send(json_request(Method::DELETE, "/api/bookmarks", Some(&token), body.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let echoed: Value = decode_json(response).await;
    assert_eq!(echoed, body);
    assert!(h.app.store.get_bookmarks(false, &[]).unwrap().is_empty());

    let bad = h
        .send(json_request(Method::DELETE, "/api/bookmarks", Some(&token), json!(["-1"])))
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

// === Pages ===

#[tokio::test]
async fn index_redirects_without_session() {
    let h = TestHarness::setup();
    let response = h.send(get("/", None)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/login");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(response.headers()[header::EXPIRES], "0");
}

#[tokio::test]
async fn session_cookie_opens_index_and_skips_login() {
    let h = TestHarness::setup();
    let token = h.token().await;

    let index = h.send(get_with_cookie("/", &token)).await;
    assert_eq!(index.status(), StatusCode::OK);

    let login = h.send(get_with_cookie("/login", &token)).await;
    assert_eq!(login.status(), StatusCode::FOUND);
    assert_eq!(login.headers()[header::LOCATION], "/");

    let anonymous = h.send(get("/login", None)).await;
    assert_eq!(anonymous.status(), StatusCode::OK);
}

#[tokio::test]
async fn cached_page_is_public_and_sanitized() {
    let h = TestHarness::setup();
    let token = h.token().await;
    let created: Value = decode_json(
        h.send(json_request(Method::POST, "/api/bookmarks", Some(&token), json!({"url": "https://example.com/x"})))
            .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let response = h.send(get(&format!("/bookmark/{}", id), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<h1>Fetched Title</h1>"));
    assert!(html.contains("Fetched body"));
    assert!(!html.contains("alert(1)"));

    let missing = h.send(get("/bookmark/9000", None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn video_files_are_streamed_from_media_dir() {
    let h = TestHarness::setup();
    let media = h.app.lifecycle.attacher().media_dir().clone();
    std::fs::create_dir_all(&media).unwrap();
    std::fs::write(media.join("clip.mp4"), b"mp4-bytes").unwrap();
    std::fs::write(h.app.settings.data_dir.join("secret.txt"), b"private").unwrap();

    let response = h.send(get("/videos/clip.mp4", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "9");
    assert_eq!(body_text(response).await, "mp4-bytes");

    let traversal = h.send(get("/videos/..%2Fsecret.txt", None)).await;
    assert_eq!(traversal.status(), StatusCode::NOT_FOUND);

    let missing = h.send(get("/videos/none.mp4", None)).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
