//! Credential storage and session invalidation.
//!
//! This module provides:
//! - `TokenStore`: bearer token + username persistence over the storage seam
//! - `SessionInvalidatedHook`: the callback fired when the server returns 401
//!
//! Credentials live under the `auth_token` and `username` storage keys and
//! are cleared globally the moment any request comes back unauthorized.

pub mod store;

pub use store::{SessionInvalidatedHook, TokenStore, TOKEN_KEY, USERNAME_KEY};
