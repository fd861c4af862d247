//! Task message model - append-only progress notes emitted during execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of note an agent emits while working a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Progress,
    Status,
    Completion,
    Error,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Progress => "progress",
            MessageType::Status => "status",
            MessageType::Completion => "completion",
            MessageType::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<MessageType> {
        match s {
            "progress" => Some(MessageType::Progress),
            "status" => Some(MessageType::Status),
            "completion" => Some(MessageType::Completion),
            "error" => Some(MessageType::Error),
            _ => None,
        }
    }
}

/// A progress/status note for one task. Append-only, ordered by timestamp
/// (the autoincrement row id breaks sub-millisecond ties on reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    /// Database row id; 0 until the message has been persisted.
    pub id: i64,
    pub task_id: String,
    pub agent_type: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: String,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

impl TaskMessage {
    pub fn new(
        task_id: &str,
        agent_type: &str,
        message_type: MessageType,
        content: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: 0,
            task_id: task_id.to_string(),
            agent_type: agent_type.to_string(),
            message_type,
            content: content.into(),
            metadata,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_type_round_trip() {
        for mt in [
            MessageType::Progress,
            MessageType::Status,
            MessageType::Completion,
            MessageType::Error,
        ] {
            assert_eq!(MessageType::from_str(mt.as_str()), Some(mt));
        }
        assert_eq!(MessageType::from_str("noise"), None);
    }

    #[test]
    fn test_message_serializes_type_field() {
        let msg = TaskMessage::new(
            "task-1",
            "import",
            MessageType::Progress,
            "parsing file",
            json!({"progress": 40}),
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], json!("progress"));
        assert_eq!(value["taskId"], json!("task-1"));
        assert_eq!(value["metadata"]["progress"], json!(40));
    }
}
