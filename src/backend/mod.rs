//! Sources of project detail, navigation and progress state.
//!
//! In offline mode everything comes from the local SQLite mirror; when a
//! backend URL is configured the REST API is the source of truth.

pub mod http;
pub mod local;

pub use http::*;
pub use local::*;

use anyhow::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use crate::config::Config;
use crate::models::{NavigationLookup, ProgressSnapshot, ProjectDetail};

/// Approval-gate decision as sent to the backend (`truth_value` is 1 or 0)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityDecision {
    pub project_id: String,
    pub truth_value: u8,
}

impl AuthorityDecision {
    pub fn new(project_id: impl Into<String>, approved: bool) -> Self {
        Self {
            project_id: project_id.into(),
            truth_value: u8::from(approved),
        }
    }

    pub fn approved(&self) -> bool {
        self.truth_value == 1
    }
}

/// Read side of the project trackers, plus the gate decision hand-off
pub trait ProjectSource {
    /// Descriptive detail for one project; fails if the project is unknown
    fn project_detail(&self, project_id: &str) -> Result<ProjectDetail>;

    /// Navigation-by-project lookup
    fn navigation(&self, project_id: &str) -> Result<NavigationLookup>;

    /// Progress-by-project; `None` when no progress is tracked for it
    fn progress(&self, project_id: &str) -> Result<Option<ProgressSnapshot>>;

    /// Progress for every known project
    fn progress_list(&self) -> Result<Vec<ProgressSnapshot>>;

    /// Hand an approval-gate decision to the source of truth
    fn submit_decision(&self, decision: &AuthorityDecision) -> Result<()>;
}

/// Pick the source for the current configuration
pub fn open_source<'c>(config: &Config, conn: &'c Connection) -> Result<Box<dyn ProjectSource + 'c>> {
    match config.backend_url.as_deref() {
        Some(url) => {
            log::debug!("Using backend at {}", url);
            Ok(Box::new(HttpSource::new(url, config.backend_timeout)?))
        }
        None => Ok(Box::new(LocalSource::new(conn))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_wire_shape() {
        let decision = AuthorityDecision::new("PSB/PROC/2025/1/2/3", true);
        assert_eq!(
            serde_json::to_value(&decision).unwrap(),
            serde_json::json!({"project_id": "PSB/PROC/2025/1/2/3", "truth_value": 1})
        );
        assert!(decision.approved());
        assert_eq!(AuthorityDecision::new("P", false).truth_value, 0);
    }
}
