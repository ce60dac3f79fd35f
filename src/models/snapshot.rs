use serde::{Deserialize, Serialize};

/// Status reported alongside a progress snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
    Rejected,
    /// Any value the backend reports that this ledger does not model
    Other(String),
}

impl ProgressStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
            ProgressStatus::Rejected => "rejected",
            ProgressStatus::Other(s) => s,
        }
    }

    /// Lenient parse: accepts "In Progress", "in-progress", "IN_PROGRESS"
    pub fn parse(s: &str) -> Self {
        let normalized: String = s.trim().to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "not_started" | "pending" => ProgressStatus::NotStarted,
            "in_progress" | "active" => ProgressStatus::InProgress,
            "completed" | "complete" => ProgressStatus::Completed,
            "rejected" => ProgressStatus::Rejected,
            _ => ProgressStatus::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for ProgressStatus {
    fn from(s: String) -> Self {
        ProgressStatus::parse(&s)
    }
}

impl From<ProgressStatus> for String {
    fn from(status: ProgressStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Page-based progress tracker as reported by the backend.
/// `current_page` is 1-indexed (page 1 = intake screen).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Absent from the by-project endpoint; filled in by the caller
    #[serde(default)]
    pub project_id: String,
    pub current_page: i64,
    pub overall_progress: f64,
    pub status: ProgressStatus,
}

impl ProgressSnapshot {
    pub fn is_complete(&self) -> bool {
        self.overall_progress >= 100.0
    }
}

/// Wire shape of the navigation-by-project lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationLookup {
    pub found: bool,
    #[serde(default)]
    pub current_stage: Option<i64>,
    #[serde(default)]
    pub current_page_component: Option<String>,
}

impl NavigationLookup {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// A usable snapshot only exists when the lookup found one with a stage
    pub fn into_snapshot(self, project_id: &str) -> Option<NavigationSnapshot> {
        if !self.found {
            return None;
        }
        self.current_stage.map(|current_stage| NavigationSnapshot {
            project_id: project_id.to_string(),
            current_stage,
            current_page_component: self.current_page_component,
        })
    }
}

/// Navigation-based tracker: the exact screen index the server believes is next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationSnapshot {
    pub project_id: String,
    pub current_stage: i64,
    pub current_page_component: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_status_parse() {
        assert_eq!(ProgressStatus::parse("In Progress"), ProgressStatus::InProgress);
        assert_eq!(ProgressStatus::parse("completed"), ProgressStatus::Completed);
        assert_eq!(ProgressStatus::parse("Rejected"), ProgressStatus::Rejected);
        assert_eq!(ProgressStatus::parse("on hold"), ProgressStatus::Other("on hold".to_string()));
    }

    #[test]
    fn test_progress_snapshot_from_backend_json() {
        let snapshot: ProgressSnapshot = serde_json::from_str(
            r#"{"project_id":"P1","current_page":4,"overall_progress":30,"status":"In Progress"}"#,
        ).unwrap();
        assert_eq!(snapshot.current_page, 4);
        assert_eq!(snapshot.overall_progress, 30.0);
        assert_eq!(snapshot.status, ProgressStatus::InProgress);
        assert!(!snapshot.is_complete());
    }

    #[test]
    fn test_navigation_lookup_found() {
        let lookup: NavigationLookup = serde_json::from_str(
            r#"{"found":true,"current_stage":7,"current_page_component":"VendorEvaluation"}"#,
        ).unwrap();
        let snapshot = lookup.into_snapshot("P1").unwrap();
        assert_eq!(snapshot.current_stage, 7);
        assert_eq!(snapshot.current_page_component.as_deref(), Some("VendorEvaluation"));
    }

    #[test]
    fn test_navigation_lookup_absent() {
        let lookup: NavigationLookup = serde_json::from_str(r#"{"found":false}"#).unwrap();
        assert!(lookup.into_snapshot("P1").is_none());

        // found without a stage carries no usable pointer
        let lookup: NavigationLookup = serde_json::from_str(r#"{"found":true}"#).unwrap();
        assert!(lookup.into_snapshot("P1").is_none());
    }
}
