use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use crate::models::stage::{FINAL_STAGE, GATE_STAGE, INITIAL_STAGE};

/// Key/value payload accumulated across stage completions.
///
/// Merging is shallow and last-write-wins: a later stage re-supplying
/// `projectId` (or any other key) replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowData(BTreeMap<String, Value>);

impl WorkflowData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow merge; keys in `other` overwrite existing keys
    pub fn merge(&mut self, other: WorkflowData) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Project identifier under either spelling used by the stage screens
    pub fn project_id(&self) -> Option<&str> {
        self.get("projectId")
            .or_else(|| self.get("project_id"))
            .and_then(Value::as_str)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(Self)
    }
}

impl FromIterator<(String, Value)> for WorkflowData {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// State of the active workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerState {
    pub current_stage: u8,
    /// `None` until the gate decides
    pub is_approved: Option<bool>,
    pub workflow_data: WorkflowData,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            current_stage: INITIAL_STAGE,
            is_approved: None,
            workflow_data: WorkflowData::new(),
        }
    }
}

impl SequencerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejected at the gate; only `reset` leaves this state
    pub fn is_rejected(&self) -> bool {
        self.current_stage == GATE_STAGE && self.is_approved == Some(false)
    }

    pub fn is_complete(&self) -> bool {
        self.current_stage == FINAL_STAGE
    }

    /// Display form of the tri-state approval flag
    pub fn approval_label(&self) -> &'static str {
        match self.is_approved {
            None => "pending",
            Some(true) => "approved",
            Some(false) => "rejected",
        }
    }
}

/// The active run: sequencer state plus the requirement record it is attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub state: SequencerState,
    pub active_project_id: Option<String>,
}

impl WorkflowSession {
    pub fn fresh() -> Self {
        Self {
            state: SequencerState::new(),
            active_project_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_last_write_wins() {
        let mut data = WorkflowData::new();
        data.insert("projectId", "P-1");
        data.insert("vendor", "Acme");

        let mut update = WorkflowData::new();
        update.insert("projectId", "P-2");
        update.insert("rfpId", 7);
        data.merge(update);

        assert_eq!(data.len(), 3);
        assert_eq!(data.get("projectId"), Some(&json!("P-2")));
        assert_eq!(data.get("vendor"), Some(&json!("Acme")));
        assert_eq!(data.get("rfpId"), Some(&json!(7)));
    }

    #[test]
    fn test_project_id_either_spelling() {
        let mut data = WorkflowData::new();
        assert_eq!(data.project_id(), None);
        data.insert("project_id", "PSB/PROC/2025/1/12/1");
        assert_eq!(data.project_id(), Some("PSB/PROC/2025/1/12/1"));
        data.insert("projectId", "PSB/PROC/2025/1/12/2");
        assert_eq!(data.project_id(), Some("PSB/PROC/2025/1/12/2"));
    }

    #[test]
    fn test_json_round_trip_keeps_value_types() {
        let mut data = WorkflowData::new();
        data.insert("score", 87.5);
        data.insert("shortlisted", json!(["Acme", "Globex"]));
        let restored = WorkflowData::from_json(&data.to_json().unwrap()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_default_state() {
        let state = SequencerState::new();
        assert_eq!(state.current_stage, 0);
        assert_eq!(state.is_approved, None);
        assert!(state.workflow_data.is_empty());
        assert!(!state.is_rejected());
        assert_eq!(state.approval_label(), "pending");
    }
}
