use serde::{Deserialize, Serialize};

/// Summary row for one configured collection, as returned by the
/// `/api/collections/*` listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub item_count: Option<u32>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub last_rotated_at: Option<String>,
}

impl CollectionSummary {
    /// Group-qualified display name for list rows.
    pub fn display_name(&self) -> String {
        match self.group.as_deref() {
            Some(group) if !group.is_empty() => format!("{}/{}", group, self.name),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection_summary() {
        let json = r#"{"id":7,"name":"Noir Classics","group":"movies","itemCount":24,"active":true,"lastRotatedAt":"2025-06-14T03:00:00Z"}"#;
        let summary: CollectionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.id, 7);
        assert!(summary.active);
        assert_eq!(summary.display_name(), "movies/Noir Classics");
    }

    #[test]
    fn test_parse_minimal_collection_summary() {
        // Older servers omit most optional fields
        let json = r#"{"id":1,"name":"Rotation A"}"#;
        let summary: CollectionSummary = serde_json::from_str(json).unwrap();
        assert!(!summary.active);
        assert_eq!(summary.display_name(), "Rotation A");
    }
}
