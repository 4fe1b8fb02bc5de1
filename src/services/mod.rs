// linkshelf services
// Services hold logic that owns no persisted state of its own.

pub mod crypto_service;
pub mod metadata_reconciler;
pub mod reader_mode;
pub mod search_engine;
pub mod settings_engine;
pub mod token_manager;
pub mod url_normalizer;
pub mod video_source;
