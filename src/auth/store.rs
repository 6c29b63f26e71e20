use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::storage::Storage;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key for the logged-in username.
pub const USERNAME_KEY: &str = "username";

/// Callback fired when the server rejects the stored credentials. The
/// hosting application subscribes to this instead of the client performing
/// navigation itself, so the side effect stays testable.
pub type SessionInvalidatedHook = Arc<dyn Fn() + Send + Sync>;

/// Credential storage shared by the API client and the application shell.
///
/// Reads go to persistent storage on every call rather than an in-memory
/// copy, so a login or logout performed by another process is picked up on
/// the next request.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored bearer token, if any. Storage failures read as logged-out.
    pub fn token(&self) -> Option<String> {
        self.read(TOKEN_KEY)
    }

    /// The stored username, if any.
    pub fn username(&self) -> Option<String> {
        self.read(USERNAME_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persist the credentials from a successful login.
    pub fn store(&self, token: &str, username: &str) -> Result<()> {
        self.storage
            .set(TOKEN_KEY, token)
            .context("Failed to store auth token")?;
        self.storage
            .set(USERNAME_KEY, username)
            .context("Failed to store username")?;
        Ok(())
    }

    /// Remove both credential keys. Best-effort: a failure to remove is
    /// logged and otherwise ignored, since the caller is already tearing
    /// the session down.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, USERNAME_KEY] {
            if let Err(e) = self.storage.remove(key) {
                debug!(key, error = %e, "Failed to clear credential key");
            }
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                debug!(key, error = %e, "Credential read failed, treating as logged out");
                None
            }
        }
    }
}
