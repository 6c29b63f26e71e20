//! Response caching for slowly-changing dashboard data.
//!
//! This module provides the `ResponseCache`, a get-or-fetch layer over
//! persistent storage used by the health overview and the collections
//! listing. Entries are wrapped in a `CachedEnvelope` carrying the write
//! timestamp (and, for collections, the server's cache version) and are
//! treated as absent after 5 minutes or on a version mismatch.

pub mod manager;

pub use manager::{
    CachedEnvelope, ResponseCache, WriteOutcome, COLLECTIONS_CACHE_KEY, HEALTH_CACHE_KEY,
};
