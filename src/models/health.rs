use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Health-check result for one integration or internal service.
/// The server defines the payload; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthComponent {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub checked_at: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

/// Service key to health result, as rendered on the dashboard.
pub type HealthReport = HashMap<String, HealthComponent>;

impl HealthComponent {
    /// Placeholder component for a service whose check never answered.
    /// A single unreachable integration must not fail the whole overview.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: "unreachable".to_string(),
            message: Some(message.into()),
            checked_at: None,
            latency_ms: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}
