use thiserror::Error;

/// Errors raised by the sequencer and reconciler.
///
/// Every variant except `Store` is a user-facing condition: the caller shows
/// the message and blocks navigation, and the workflow state is untouched.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Cannot {operation} at stage {stage}: {reason}")]
    InvalidTransition {
        operation: &'static str,
        stage: u8,
        reason: String,
    },
    #[error("Invalid stage {0}: stages run from 0 to 10")]
    InvalidStage(i64),
    #[error("Failed to load project '{project_id}': {reason}")]
    ProjectLoad { project_id: String, reason: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl WorkflowError {
    pub(crate) fn transition(operation: &'static str, stage: u8, reason: impl Into<String>) -> Self {
        WorkflowError::InvalidTransition {
            operation,
            stage,
            reason: reason.into(),
        }
    }

    /// Whether this error is a user error (exit code 1) rather than an internal failure
    pub fn is_user_error(&self) -> bool {
        !matches!(self, WorkflowError::Store(_))
    }
}

pub type WorkflowResult<T> = std::result::Result<T, WorkflowError>;
