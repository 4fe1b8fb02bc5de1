//! App Core for linkshelf.
//!
//! Central struct wiring the store, the lifecycle manager, search and tokens
//! together. Shared by the CLI and the HTTP server.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::database::connection::Database;
use crate::managers::account_manager::{AccountManager, AccountStore};
use crate::managers::bookmark_manager::{BookmarkManager, BookmarkStore};
use crate::managers::download_manager::VideoAttacher;
use crate::managers::lifecycle_manager::LifecycleManager;
use crate::services::crypto_service::{CryptoService, CryptoServiceTrait};
use crate::services::metadata_reconciler::MetadataReconciler;
use crate::services::reader_mode::{ContentExtractor, ReadabilityExtractor};
use crate::services::search_engine::SearchEngine;
use crate::services::token_manager::TokenManager;
use crate::services::video_source::{VideoSource, YtDlpSource};
use crate::types::errors::AuthError;
use crate::types::settings::ServerSettings;

/// Central application struct holding all managers and services.
pub struct App {
    pub settings: ServerSettings,
    pub db: Arc<Database>,
    pub store: Arc<dyn BookmarkStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub lifecycle: LifecycleManager,
    pub search: SearchEngine,
    pub tokens: TokenManager,
}

impl App {
    /// Opens the on-disk database and wires the default collaborators.
    pub fn new(settings: ServerSettings) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&settings.data_dir)
            .map_err(|e| format!("Failed to create {}: {}", settings.data_dir.display(), e))?;
        let db = Arc::new(Database::open(settings.database_path())?);

        let extractor: Arc<dyn ContentExtractor> = Arc::new(ReadabilityExtractor::new(
            Duration::from_secs(settings.extractor_timeout_secs),
        ));
        let video_source: Arc<dyn VideoSource> = Arc::new(YtDlpSource::new(
            settings.yt_dlp_path.clone(),
            Duration::from_secs(settings.download_timeout_secs),
        ));
        let crypto: Arc<dyn CryptoServiceTrait> = Arc::new(CryptoService::new());

        Ok(Self::from_parts(settings, db, extractor, video_source, crypto)?)
    }

    /// Wires an app from explicit collaborators.
    pub fn from_parts(
        settings: ServerSettings,
        db: Arc<Database>,
        extractor: Arc<dyn ContentExtractor>,
        video_source: Arc<dyn VideoSource>,
        crypto: Arc<dyn CryptoServiceTrait>,
    ) -> Result<Self, AuthError> {
        let store: Arc<dyn BookmarkStore> = Arc::new(BookmarkManager::new(db.clone()));
        let accounts: Arc<dyn AccountStore> =
            Arc::new(AccountManager::with_crypto(db.clone(), crypto.clone()));

        let reconciler = MetadataReconciler::new(
            extractor,
            Duration::from_secs(settings.extractor_timeout_secs),
        );
        let attacher = VideoAttacher::new(
            video_source,
            settings.media_path(),
            settings.video_hosts.clone(),
            Duration::from_secs(settings.download_timeout_secs),
        );
        let lifecycle = LifecycleManager::new(store.clone(), reconciler, attacher);
        let search = SearchEngine::new(store.clone());

        let signing_key = crypto
            .generate_signing_key()
            .map_err(|e| AuthError::SigningFailed(e.to_string()))?;
        let tokens = TokenManager::new(signing_key, accounts.clone(), crypto)?;

        Ok(Self {
            settings,
            db,
            store,
            accounts,
            lifecycle,
            search,
            tokens,
        })
    }

    /// Current UNIX time in seconds, used for token checks.
    pub fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}
