//! Client core for the Rotarr collection rotation server.
//!
//! Rotarr rotates home-media collections (Plex, with Trakt and Letterboxd
//! list sources) on a schedule; this crate is the operator console's client
//! side: an authenticated API client, a TTL + version invalidated response
//! cache over persistent storage, relative-time/countdown formatting, and a
//! log poller. All rotation logic lives in the server; the console only
//! fetches, caches, and renders.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod poll;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::TokenStore;
pub use cache::ResponseCache;
pub use config::Config;
pub use storage::{FileStorage, MemoryStorage, Storage};
