//! Utility functions for timestamp formatting.

pub mod time;

// Re-export commonly used functions at module level
pub use time::{normalize_iso, time_ago, time_ago_at, time_until, time_until_at};
