use serde::{Deserialize, Serialize};
use crate::models::workflow::WorkflowData;

/// Requirement priority as chosen on the intake form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Case-insensitive parse ("High", "high", "HIGH")
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// Lifecycle status mirrored onto the requirement record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    InProgress,
    Approved,
    Rejected,
    Completed,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::InProgress => "in_progress",
            RequirementStatus::Approved => "approved",
            RequirementStatus::Rejected => "rejected",
            RequirementStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(RequirementStatus::InProgress),
            "approved" => Some(RequirementStatus::Approved),
            "rejected" => Some(RequirementStatus::Rejected),
            "completed" => Some(RequirementStatus::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequirementStatus::InProgress => "In Progress",
            RequirementStatus::Approved => "Approved",
            RequirementStatus::Rejected => "Rejected",
            RequirementStatus::Completed => "Completed",
        }
    }
}

/// Fields submitted on the requirement-intake screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequirement {
    pub title: String,
    pub department: String,
    pub category: String,
    pub priority: Priority,
    pub estimated_amount: f64,
    pub business_justification: String,
    pub submitted_by: String,
    pub technical_specification: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl NewRequirement {
    /// Check required fields; returns the first problem found
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("Title", &self.title),
            ("Department", &self.department),
            ("Category", &self.category),
            ("Business justification", &self.business_justification),
            ("Submitted by", &self.submitted_by),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} cannot be empty", field));
            }
        }
        if !self.estimated_amount.is_finite() || self.estimated_amount <= 0.0 {
            return Err(format!(
                "Invalid estimated amount: {}. Amount must be a positive number.",
                self.estimated_amount
            ));
        }
        Ok(())
    }

    /// Workflow data seeded by a successful intake
    pub fn to_workflow_data(&self, project_id: &str) -> WorkflowData {
        let mut data = WorkflowData::new();
        data.insert("projectId", project_id);
        data.insert("projectTitle", self.title.clone());
        data.insert("department", self.department.clone());
        data.insert("category", self.category.clone());
        data.insert("priority", self.priority.as_str());
        data.insert("estimatedAmount", self.estimated_amount);
        data.insert("submittedBy", self.submitted_by.clone());
        data
    }
}

/// Requirement (project) record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Option<i64>,
    pub project_id: String,
    pub title: String,
    pub department: String,
    pub category: String,
    pub priority: Priority,
    pub estimated_amount: f64,
    pub business_justification: String,
    pub submitted_by: String,
    pub technical_specification: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub stage: u8,
    pub status: RequirementStatus,
    pub workflow_data: WorkflowData,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Requirement {
    /// Build a fresh record for a just-submitted requirement (stage 1)
    pub fn new(project_id: String, form: NewRequirement) -> Self {
        let now = chrono::Utc::now().timestamp();
        let workflow_data = form.to_workflow_data(&project_id);
        Self {
            id: None,
            project_id,
            title: form.title,
            department: form.department,
            category: form.category,
            priority: form.priority,
            estimated_amount: form.estimated_amount,
            business_justification: form.business_justification,
            submitted_by: form.submitted_by,
            technical_specification: form.technical_specification,
            email: form.email,
            phone_number: form.phone_number,
            stage: 1,
            status: RequirementStatus::InProgress,
            workflow_data,
            created_ts: now,
            modified_ts: now,
        }
    }
}

/// Project detail as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project_id: String,
    pub title: String,
    pub department: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub estimated_amount: f64,
    #[serde(default)]
    pub business_justification: String,
    #[serde(default)]
    pub submitted_by: String,
    #[serde(default)]
    pub technical_specification: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl ProjectDetail {
    /// Workflow data seeded when resuming this project
    pub fn to_workflow_data(&self) -> WorkflowData {
        let mut data = WorkflowData::new();
        data.insert("projectId", self.project_id.clone());
        data.insert("projectTitle", self.title.clone());
        data.insert("department", self.department.clone());
        data
    }
}

impl From<&Requirement> for ProjectDetail {
    fn from(req: &Requirement) -> Self {
        Self {
            project_id: req.project_id.clone(),
            title: req.title.clone(),
            department: req.department.clone(),
            category: req.category.clone(),
            priority: req.priority.as_str().to_string(),
            estimated_amount: req.estimated_amount,
            business_justification: req.business_justification.clone(),
            submitted_by: req.submitted_by.clone(),
            technical_specification: req.technical_specification.clone(),
            email: req.email.clone(),
            phone_number: req.phone_number.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_form() -> NewRequirement {
        NewRequirement {
            title: "Core banking servers".to_string(),
            department: "IT".to_string(),
            category: "Hardware".to_string(),
            priority: Priority::High,
            estimated_amount: 2_500_000.0,
            business_justification: "Capacity for branch rollout".to_string(),
            submitted_by: "R. Sharma".to_string(),
            technical_specification: None,
            email: None,
            phone_number: None,
        }
    }

    #[test]
    fn test_priority_conversion() {
        assert_eq!(Priority::from_str("High"), Some(Priority::High));
        assert_eq!(Priority::from_str(" critical "), Some(Priority::Critical));
        assert_eq!(Priority::Low.as_str(), "low");
        assert_eq!(Priority::from_str("urgent"), None);
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(RequirementStatus::from_str("rejected"), Some(RequirementStatus::Rejected));
        assert_eq!(RequirementStatus::InProgress.as_str(), "in_progress");
        assert_eq!(RequirementStatus::InProgress.label(), "In Progress");
        assert_eq!(RequirementStatus::from_str("In Progress"), None);
    }

    #[test]
    fn test_validate_requires_fields() {
        assert!(sample_form().validate().is_ok());

        let mut form = sample_form();
        form.title = "  ".to_string();
        assert_eq!(form.validate().unwrap_err(), "Title cannot be empty");

        let mut form = sample_form();
        form.estimated_amount = 0.0;
        assert!(form.validate().is_err());

        let mut form = sample_form();
        form.estimated_amount = f64::NAN;
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_new_requirement_seeds_workflow_data() {
        let req = Requirement::new("PSB/PROC/2025/3/4/1".to_string(), sample_form());
        assert_eq!(req.stage, 1);
        assert_eq!(req.status, RequirementStatus::InProgress);
        assert_eq!(req.workflow_data.project_id(), Some("PSB/PROC/2025/3/4/1"));
        assert_eq!(
            req.workflow_data.get("projectTitle").and_then(|v| v.as_str()),
            Some("Core banking servers")
        );
    }
}
