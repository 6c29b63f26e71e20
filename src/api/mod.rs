//! REST API client module for the Rotarr server.
//!
//! This module provides the `ApiClient` for talking to the rotation
//! backend: auth, per-service health checks, collection listings, the
//! rotation schedule, log tailing, and admin config.
//!
//! Requests carry a bearer token read from the `TokenStore` at call time;
//! any 401 response invalidates the stored session globally.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
