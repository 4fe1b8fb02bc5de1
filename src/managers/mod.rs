// linkshelf state managers
// Managers own persisted state and the bookmark lifecycle built on it.

pub mod account_manager;
pub mod bookmark_manager;
pub mod download_manager;
pub mod lifecycle_manager;
