// CLI parsing utilities for stage-completion fields and gate decisions

use serde_json::Value;
use crate::models::WorkflowData;

/// Problem with a `key=value` field token
#[derive(Debug, PartialEq)]
pub enum FieldParseError {
    MissingEquals {
        token: String,
    },
    EmptyKey {
        token: String,
    },
}

impl std::fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldParseError::MissingEquals { token } => {
                write!(f, "Unrecognized field token '{}'\n  Fields are written as key=value.", token)
            }
            FieldParseError::EmptyKey { token } => {
                write!(f, "Field '{}' has an empty key", token)
            }
        }
    }
}

/// Parse a single field value: valid JSON is kept as JSON
/// (`score=87.5`, `ok=true`, `vendors=["A","B"]`), anything else is a string
pub fn parse_field_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse `key=value` tokens into stage-completion data.
/// Repeated keys keep the last value.
pub fn parse_workflow_fields(args: &[String]) -> Result<WorkflowData, FieldParseError> {
    let mut data = WorkflowData::new();
    for token in args {
        let Some((key, value)) = token.split_once('=') else {
            return Err(FieldParseError::MissingEquals { token: token.clone() });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(FieldParseError::EmptyKey { token: token.clone() });
        }
        data.insert(key, parse_field_value(value));
    }
    Ok(data)
}

/// Parse a gate decision: approve/reject (also yes/no, 1/0, true/false)
pub fn parse_decision(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "approve" | "approved" | "yes" | "y" | "true" | "1" => Ok(true),
        "reject" | "rejected" | "no" | "n" | "false" | "0" => Ok(false),
        _ => Err(format!(
            "Invalid decision: '{}'. Use 'approve' or 'reject'.",
            raw
        )),
    }
}
