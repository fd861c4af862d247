//! Artifact model - the immutable output record of one agent execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One agent's output for one task. Never mutated or deleted once created;
/// the persistence layer only ever inserts and reads these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub task_id: String,
    pub agent_type: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub data: Value,
    #[serde(rename = "created")]
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Stamp a fresh artifact for an agent's output payload. The type
    /// defaults to `<agentType>_result`.
    pub fn new(agent_type: &str, task_id: &str, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            agent_type: agent_type.to_string(),
            artifact_type: format!("{}_result", agent_type),
            data,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artifact_type_defaults_to_agent_result() {
        let artifact = Artifact::new("import", "task-1", json!({"insertedCount": 3}));
        assert_eq!(artifact.artifact_type, "import_result");
        assert_eq!(artifact.task_id, "task-1");
        assert_eq!(artifact.data["insertedCount"], json!(3));
    }

    #[test]
    fn test_artifact_ids_are_unique() {
        let a = Artifact::new("import", "task-1", json!({}));
        let b = Artifact::new("import", "task-1", json!({}));
        assert_ne!(a.id, b.id);
    }
}
