//! Data models for Rotarr server responses.
//!
//! This module contains the response shapes the console renders:
//!
//! - `HealthComponent` / `HealthReport`: per-service health checks
//! - `CollectionSummary`: rows of the collections listings
//! - `RotationEvent`, `LogEntry`: scheduling and log-tail views
//!
//! Admin config payloads are intentionally not modeled; they pass through
//! as `serde_json::Value` since the server owns their shape.

pub mod collection;
pub mod health;
pub mod rotation;

pub use collection::CollectionSummary;
pub use health::{HealthComponent, HealthReport};
pub use rotation::{LogEntry, RotationEvent};
