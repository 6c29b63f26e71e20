//! HTTP client for the Rotarr server REST API.
//!
//! Every request reads the bearer token from the `TokenStore` at call time,
//! so a login or logout performed elsewhere is picked up on the next call.
//! A 401 from any endpoint tears the session down globally: both credential
//! keys are cleared and the session-invalidated hook fires, while the
//! response is still handed back to the caller.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{SessionInvalidatedHook, TokenStore};
use crate::cache::{ResponseCache, COLLECTIONS_CACHE_KEY, HEALTH_CACHE_KEY};
use crate::models::{CollectionSummary, HealthComponent, HealthReport, LogEntry, RotationEvent};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s tolerates a slow home server while still failing fast enough.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Services whose health checks make up the dashboard overview.
const HEALTH_SERVICES: [&str; 4] = ["plex", "trakt", "letterboxd", "scheduler"];

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct CacheVersionResponse {
    version: u64,
}

/// API client for the Rotarr server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: TokenStore,
    on_session_invalidated: Option<SessionInvalidatedHook>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            on_session_invalidated: None,
        })
    }

    /// Register the callback fired when any request comes back 401.
    pub fn on_session_invalidated(mut self, hook: SessionInvalidatedHook) -> Self {
        self.on_session_invalidated = Some(hook);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build the auth header set for a request. Caller-supplied headers are
    /// merged later by reqwest, so only the Authorization entry lives here.
    fn auth_headers(token: Option<&str>) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Send a request with bearer injection and global 401 handling.
    /// Returns the response in all cases, including 401.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.token();
        let response = request
            .headers(Self::auth_headers(token.as_deref())?)
            .send()
            .await
            .context("Failed to send request")?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }
        Ok(response)
    }

    /// Global side effect of an unauthorized response: clear both stored
    /// credential keys and notify the hosting application, once per response.
    fn handle_unauthorized(&self) {
        warn!("Server returned 401, invalidating session");
        self.tokens.clear();
        if let Some(hook) = &self.on_session_invalidated {
            hook();
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self.send(self.client.get(&url)).await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self.send(self.client.post(&url).json(body)).await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    // ===== Auth =====

    /// Authenticate and persist the returned bearer token and username.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let auth: LoginResponse = self
            .post_json("/api/auth/login", &LoginRequest { username, password })
            .await
            .context("Login failed")?;

        self.tokens.store(&auth.token, username)?;
        debug!(username, "Login succeeded");
        Ok(())
    }

    /// End the server session and drop the stored credentials. The local
    /// clear happens even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let url = self.url("/api/auth/logout");
        if let Err(e) = self.send(self.client.post(&url)).await {
            debug!(error = %e, "Logout request failed, clearing local session anyway");
        }
        self.tokens.clear();
        Ok(())
    }

    // ===== Health =====

    /// Health check for a single service.
    pub async fn fetch_health(&self, service: &str) -> Result<HealthComponent> {
        self.get_json(&format!("/api/health/{}", service)).await
    }

    /// Health checks for all dashboard services, issued concurrently and
    /// joined once all settle. A service whose check fails is reported as
    /// unreachable rather than failing the whole overview.
    pub async fn fetch_health_overview(&self) -> Result<HealthReport> {
        let checks = HEALTH_SERVICES
            .iter()
            .map(|service| async move { (*service, self.fetch_health(service).await) });

        let mut report = HealthReport::new();
        for (service, result) in future::join_all(checks).await {
            let component = match result {
                Ok(component) => component,
                Err(e) => {
                    warn!(service, error = %e, "Health check failed");
                    HealthComponent::unreachable(e.to_string())
                }
            };
            report.insert(service.to_string(), component);
        }
        Ok(report)
    }

    /// Cached health overview (TTL-only validity).
    pub async fn health_overview(&self, cache: &ResponseCache) -> Result<HealthReport> {
        cache
            .get_or_fetch(HEALTH_CACHE_KEY, || self.fetch_health_overview())
            .await
    }

    // ===== Collections =====

    /// Collections currently in rotation. Small payload, never cached.
    pub async fn fetch_active_collections(&self) -> Result<Vec<CollectionSummary>> {
        self.get_json("/api/collections/active").await
    }

    /// The full collections listing, uncached.
    pub async fn fetch_all_collections(&self) -> Result<Vec<CollectionSummary>> {
        self.get_json("/api/collections/all").await
    }

    /// The server's collections mutation counter. Bumped whenever an admin
    /// changes a collection, so clients can invalidate inside the TTL.
    pub async fn fetch_cache_version(&self) -> Result<u64> {
        let response: CacheVersionResponse = self.get_json("/api/collections/cache-version").await?;
        Ok(response.version)
    }

    /// Cached full listing, invalidated by TTL or by a bumped server version.
    pub async fn all_collections(&self, cache: &ResponseCache) -> Result<Vec<CollectionSummary>> {
        cache
            .get_or_fetch_versioned(
                COLLECTIONS_CACHE_KEY,
                || self.fetch_all_collections(),
                || self.fetch_cache_version(),
            )
            .await
    }

    // ===== Rotation & logs =====

    /// The next scheduled rotation run, for the dashboard countdown.
    pub async fn fetch_next_rotation(&self) -> Result<RotationEvent> {
        self.get_json("/api/rotation/next").await
    }

    /// Tail of the server log, newest last.
    pub async fn fetch_recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.get_json(&format!("/api/logs/recent?limit={}", limit))
            .await
    }

    // ===== Admin config =====

    /// Admin config payloads are opaque to the console; the server owns
    /// their shape.
    pub async fn fetch_admin_config(&self, section: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("/api/admin/config/{}", section)).await
    }

    pub async fn update_admin_config(
        &self,
        section: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = self.url(&format!("/api/admin/config/{}", section));
        let response = self.send(self.client.put(&url).json(body)).await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &text).into());
        }
        response
            .json()
            .await
            .context("Failed to parse admin config response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TOKEN_KEY, USERNAME_KEY};
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn client_with_storage() -> (Arc<MemoryStorage>, ApiClient) {
        let storage = Arc::new(MemoryStorage::new());
        let tokens = TokenStore::new(storage.clone());
        let client = ApiClient::new("http://127.0.0.1:8077/", tokens).unwrap();
        (storage, client)
    }

    #[test]
    fn test_auth_headers_with_token() {
        let headers = ApiClient::auth_headers(Some("tok-123")).unwrap();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer tok-123"
        );
    }

    #[test]
    fn test_auth_headers_without_token() {
        let headers = ApiClient::auth_headers(None).unwrap();
        assert!(headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_url_joining_trims_trailing_slash() {
        let (_, client) = client_with_storage();
        assert_eq!(
            client.url("/api/collections/all"),
            "http://127.0.0.1:8077/api/collections/all"
        );
    }

    #[test]
    fn test_handle_unauthorized_clears_keys_and_fires_hook_once() {
        let (storage, client) = client_with_storage();
        client.tokens.store("tok-123", "operator").unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let hook_fired = fired.clone();
        let client = client.on_session_invalidated(Arc::new(move || {
            hook_fired.fetch_add(1, Ordering::SeqCst);
        }));

        client.handle_unauthorized();

        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
        assert!(storage.get(USERNAME_KEY).unwrap().is_none());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handle_unauthorized_without_hook_is_harmless() {
        let (storage, client) = client_with_storage();
        client.tokens.store("tok-123", "operator").unwrap();

        client.handle_unauthorized();
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_parse_login_response() {
        let auth: LoginResponse =
            serde_json::from_str(r#"{"token":"abc123","expiresIn":86400}"#).unwrap();
        assert_eq!(auth.token, "abc123");
    }

    #[test]
    fn test_parse_cache_version_response() {
        let v: CacheVersionResponse = serde_json::from_str(r#"{"version":17}"#).unwrap();
        assert_eq!(v.version, 17);
    }
}
