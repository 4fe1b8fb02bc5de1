//! linkshelf: a self-hosted bookmark shelf that caches article content and
//! serves it over a token-authenticated HTTP API.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod platform;
pub mod server;
pub mod services;
pub mod types;
