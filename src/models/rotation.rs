use serde::{Deserialize, Serialize};

use crate::utils::time_until;

/// A scheduled rotation run, past or upcoming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationEvent {
    #[serde(default)]
    pub group: Option<String>,
    pub scheduled_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RotationEvent {
    /// Countdown string for the dashboard ("1h 2m 5s", or "overdue").
    pub fn countdown(&self) -> String {
        time_until(&self.scheduled_at)
    }
}

/// One line of server log output, as served by the log-tail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: String,
    #[serde(default)]
    pub level: Option<String>,
    pub message: String,
}

impl LogEntry {
    pub fn display_line(&self) -> String {
        match self.level.as_deref() {
            Some(level) => format!("{} [{}] {}", self.timestamp, level, self.message),
            None => format!("{} {}", self.timestamp, self.message),
        }
    }
}
