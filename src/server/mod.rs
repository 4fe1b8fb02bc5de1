//! HTTP server for linkshelf.
//!
//! `/api/*` routes take a bearer token and answer JSON; `/` and `/login`
//! use the `token` cookie and redirect instead of failing.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::app::App;

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod pages;

/// Builds the full route table.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login_page))
        .route("/bookmark/{id}", get(pages::bookmark_cache))
        .route("/videos/{file}", get(pages::video_file))
        .route("/api/login", post(handlers::login))
        .route(
            "/api/bookmarks",
            get(handlers::list_bookmarks)
                .post(handlers::create_bookmark)
                .put(handlers::update_bookmark)
                .delete(handlers::delete_bookmarks),
        )
        .route("/api/tags", get(handlers::list_tags))
        .with_state(app)
}

/// Serves until Ctrl-C.
pub async fn serve(app: Arc<App>, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(addr = %listener.local_addr()?, "Serving linkshelf");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
