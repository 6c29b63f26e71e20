use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::storage::Storage;
use crate::utils::time_ago;

/// Consider cache entries absent after 5 minutes.
/// Bounds how stale the dashboard and collections views can get between
/// refetches of slowly-changing data.
const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

/// Storage key for the health-check overview (TTL-only validity).
pub const HEALTH_CACHE_KEY: &str = "health_status";

/// Storage key for the full collections listing (TTL + server version).
pub const COLLECTIONS_CACHE_KEY: &str = "collections_all";

/// Stored wrapper around a cached payload.
///
/// `timestamp` is the client's wall clock at write time (epoch millis), never
/// the server's. `version` is only populated for payloads whose endpoint
/// exposes a server-side mutation counter; a fetched version that differs
/// from the stored one means the entry is semantically stale even inside the
/// TTL window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEnvelope<T> {
    pub data: T,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl<T> CachedEnvelope<T> {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.timestamp
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) > CACHE_TTL_MS
    }

    /// True if the entry cannot be trusted: TTL exceeded, or a live version
    /// was supplied and does not match the stored one. An entry written
    /// without a version never matches a supplied live version.
    pub fn is_stale(&self, now_ms: i64, fetched_version: Option<u64>) -> bool {
        self.is_expired(now_ms) || self.version_mismatch(fetched_version)
    }

    fn version_mismatch(&self, fetched_version: Option<u64>) -> bool {
        match fetched_version {
            Some(live) => self.version != Some(live),
            None => false,
        }
    }

    /// Human-readable age of this entry, for list footers.
    pub fn age_display(&self) -> String {
        match Utc.timestamp_millis_opt(self.timestamp).single() {
            Some(written) => time_ago(&written.to_rfc3339()),
            None => "never".to_string(),
        }
    }
}

/// Outcome of a best-effort cache write. Writes never fail the caller; a
/// swallowed storage error is observable here so tests can assert on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Skipped,
}

/// Get-or-fetch cache over persistent storage.
///
/// Purely advisory: every cache-layer failure degrades to "treat as miss,
/// hit the network". Only errors from the fetch closures themselves reach
/// the caller. Concurrent writers race with last-write-wins semantics,
/// which is acceptable because the backend stays the source of truth.
pub struct ResponseCache {
    storage: Arc<dyn Storage>,
}

impl ResponseCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read a non-expired envelope from storage. Fails closed: a missing
    /// entry, corrupt payload, or storage error all read as `None`. An entry
    /// found TTL-expired is purged from storage as a side effect.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<CachedEnvelope<T>> {
        self.load_at(key, Utc::now().timestamp_millis())
    }

    fn load_at<T: DeserializeOwned>(&self, key: &str, now_ms: i64) -> Option<CachedEnvelope<T>> {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let envelope: CachedEnvelope<T> = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(key, error = %e, "Cache entry corrupt, treating as miss");
                return None;
            }
        };

        if envelope.is_expired(now_ms) {
            debug!(key, age_ms = envelope.age_ms(now_ms), "Cache entry expired, purging");
            if let Err(e) = self.storage.remove(key) {
                debug!(key, error = %e, "Failed to purge expired cache entry");
            }
            return None;
        }

        Some(envelope)
    }

    /// Write `{data, timestamp: now}` under `key`, replacing any previous
    /// entry. Never fails.
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> WriteOutcome {
        self.save_with_version(key, data, None)
    }

    pub fn save_with_version<T: Serialize>(
        &self,
        key: &str,
        data: &T,
        version: Option<u64>,
    ) -> WriteOutcome {
        let envelope = CachedEnvelope {
            data,
            timestamp: Utc::now().timestamp_millis(),
            version,
        };

        let raw = match serde_json::to_string(&envelope) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key, error = %e, "Failed to serialize cache entry");
                return WriteOutcome::Skipped;
            }
        };

        match self.storage.set(key, &raw) {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                debug!(key, error = %e, "Cache write failed, continuing without cache");
                WriteOutcome::Skipped
            }
        }
    }

    /// Return cached data when a valid entry exists, otherwise run `fetch`,
    /// write the result through, and return it. Fetch errors propagate.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(envelope) = self.load::<T>(key) {
            debug!(key, "Cache hit");
            return Ok(envelope.data);
        }

        let data = fetch().await?;
        self.save(key, &data);
        Ok(data)
    }

    /// Like `get_or_fetch`, but consults a server-side version counter before
    /// trusting a non-expired hit, so mutations made elsewhere invalidate the
    /// entry inside the TTL window. The version check always hits the
    /// network; if it fails, validity falls back to TTL alone.
    pub async fn get_or_fetch_versioned<T, F, Fut, V, VFut>(
        &self,
        key: &str,
        fetch: F,
        fetch_version: V,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        V: FnOnce() -> VFut,
        VFut: Future<Output = Result<u64>>,
    {
        let now_ms = Utc::now().timestamp_millis();
        let cached = self.load_at::<T>(key, now_ms);

        let live_version = match fetch_version().await {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(key, error = %e, "Version check failed, trusting TTL only");
                None
            }
        };

        if let Some(envelope) = cached {
            if !envelope.is_stale(now_ms, live_version) {
                debug!(key, version = ?envelope.version, "Cache hit");
                return Ok(envelope.data);
            }
            debug!(
                key,
                cached_version = ?envelope.version,
                live_version = ?live_version,
                "Cache version mismatch, refetching"
            );
        }

        let data = fetch().await?;
        self.save_with_version(key, &data, live_version);
        Ok(data)
    }
}

// ============================================================================
// Tests
// ============================================================================
