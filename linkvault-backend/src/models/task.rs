//! Task model - the unit of orchestrated work

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Task lifecycle status: pending -> running -> {completed | failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<TaskStatus> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "running" => Some(TaskStatus::Running),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Completed and failed tasks never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// The agent sequence snapshotted from the catalog at creation time.
///
/// A later catalog change cannot alter an in-flight task: the resolved list
/// lives on the task row, not in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub agents: Vec<String>,
    pub current_step: usize,
    pub current_agent: Option<String>,
}

impl WorkflowState {
    pub fn new(agents: Vec<String>) -> Self {
        Self {
            agents,
            current_step: 0,
            current_agent: None,
        }
    }

    /// True once every agent in the sequence has completed.
    pub fn is_exhausted(&self) -> bool {
        self.current_step >= self.agents.len()
    }

    /// Derived progress percentage (0-100) from the step index.
    pub fn progress_percent(&self) -> u32 {
        if self.agents.is_empty() {
            return 100;
        }
        (self.current_step * 100 / self.agents.len()) as u32
    }
}

/// One workflow execution instance with its own context, status, and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Workflow name this task was created from.
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: TaskStatus,
    /// Open key/value map accumulating every agent's contribution plus the
    /// caller-supplied initial fields. Merge-only during a run.
    pub context: Map<String, Value>,
    pub workflow: WorkflowState,
    /// Artifact ids in completion order (equals workflow order).
    pub artifacts: Vec<String>,
    /// Free-form: errorMessage on failure, derived progress percentage.
    pub metadata: Map<String, Value>,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updated")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(workflow_name: &str, agents: Vec<String>, context: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            task_type: workflow_name.to_string(),
            status: TaskStatus::Pending,
            context,
            workflow: WorkflowState::new(agents),
            artifacts: Vec::new(),
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge an agent's output fields into the shared context. Keys are added
    /// or overwritten, never removed, so caller-supplied fields survive the
    /// whole run.
    pub fn merge_context(&mut self, output: &Value) {
        if let Value::Object(fields) = output {
            for (key, value) in fields {
                self.context.insert(key.clone(), value.clone());
            }
        }
    }

    /// Record the failure on the task, making it terminal.
    pub fn mark_failed(&mut self, error_message: &str) {
        self.status = TaskStatus::Failed;
        self.workflow.current_agent = None;
        self.metadata.insert(
            "errorMessage".to_string(),
            Value::String(error_message.to_string()),
        );
        self.updated_at = Utc::now();
    }

    pub fn error_message(&self) -> Option<&str> {
        self.metadata.get("errorMessage").and_then(|v| v.as_str())
    }
}

/// Aggregate task counts by status, for the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_task() -> Task {
        let mut context = Map::new();
        context.insert("userId".to_string(), json!("u1"));
        Task::new(
            "full_import",
            vec![
                "import".to_string(),
                "validation".to_string(),
                "enrichment".to_string(),
            ],
            context,
        )
    }

    #[test]
    fn test_new_task_is_pending_at_step_zero() {
        let task = sample_task();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.workflow.current_step, 0);
        assert!(!task.workflow.is_exhausted());
        assert_eq!(task.workflow.progress_percent(), 0);
    }

    #[test]
    fn test_merge_context_keeps_caller_keys() {
        let mut task = sample_task();
        task.merge_context(&json!({"bookmarkIds": ["bm-1"], "userId": "u1"}));
        assert_eq!(task.context.get("userId"), Some(&json!("u1")));
        assert_eq!(task.context.get("bookmarkIds"), Some(&json!(["bm-1"])));

        // non-object outputs merge nothing
        task.merge_context(&json!("scalar"));
        assert_eq!(task.context.len(), 2);
    }

    #[test]
    fn test_mark_failed_records_error() {
        let mut task = sample_task();
        task.mark_failed("disk read error");
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.status.is_terminal());
        assert_eq!(task.error_message(), Some("disk read error"));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_task_serializes_with_public_field_names() {
        let task = sample_task();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["type"], json!("full_import"));
        assert_eq!(value["status"], json!("pending"));
        assert_eq!(value["workflow"]["currentStep"], json!(0));
        assert!(value.get("created").is_some());
        assert!(value.get("updated").is_some());
    }
}
