// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate a project id typed on the command line
pub fn validate_project_id(id: &str) -> Result<String, String> {
    let id = id.trim();
    validate_non_empty(id, "Project ID")?;
    if id.chars().any(char::is_whitespace) {
        return Err(format!("Invalid project ID: '{}'. Project IDs cannot contain spaces.", id));
    }
    Ok(id.to_string())
}

/// Validate an overall-progress percentage
pub fn validate_percent(value: f64) -> Result<f64, String> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("Invalid progress: {}. Progress must be between 0 and 100.", value))
    }
}

/// Validate a 1-indexed progress page
pub fn validate_page(page: i64) -> Result<i64, String> {
    if page >= 0 {
        Ok(page)
    } else {
        Err(format!("Invalid page: {}. Page numbers cannot be negative.", page))
    }
}
