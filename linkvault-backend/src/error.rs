//! Crate-wide error taxonomy for the orchestration core.
//!
//! Task-level failures (`InputValidation`, `AgentExecution`) terminate the
//! task they belong to but never the process; creation-time failures
//! (`UnknownWorkflow`) are rejected before anything is persisted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The requested workflow name does not exist in the catalog.
    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),

    /// A workflow references an agent type that is not currently registered.
    #[error("agent not registered: {0}")]
    AgentNotRegistered(String),

    /// An agent candidate was offered for registration without an agent type.
    #[error("agent has no agent type")]
    MissingAgentType,

    /// A declared input was missing or carried the wrong runtime type.
    #[error("invalid input '{field}': {reason}")]
    InputValidation { field: String, reason: String },

    /// The agent's own domain logic failed.
    #[error("{0}")]
    AgentExecution(String),

    /// Unknown task, artifact, or bookmark id on a read path.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl OrchestratorError {
    /// Missing required input, naming the field.
    pub fn missing_input(field: impl Into<String>) -> Self {
        OrchestratorError::InputValidation {
            field: field.into(),
            reason: "required field is missing".to_string(),
        }
    }

    /// Type mismatch on a declared input, naming the field and both types.
    pub fn input_type_mismatch(
        field: impl Into<String>,
        expected: &str,
        actual: &str,
    ) -> Self {
        OrchestratorError::InputValidation {
            field: field.into(),
            reason: format!("expected {}, got {}", expected, actual),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_name_the_field() {
        let err = OrchestratorError::missing_input("filePath");
        assert!(err.to_string().contains("filePath"));

        let err = OrchestratorError::input_type_mismatch("bookmarkIds", "array", "string");
        let msg = err.to_string();
        assert!(msg.contains("bookmarkIds"));
        assert!(msg.contains("array"));
        assert!(msg.contains("string"));
    }
}
