//! Gateway event protocol - typed constructors for everything the
//! orchestrator pushes to live subscribers

use crate::models::{Task, TaskMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types for gateway broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Stream session events
    Connected,
    Snapshot,
    // Task lifecycle events
    TaskCreated,
    TaskCompleted,
    TaskFailed,
    // Agent step events
    AgentStarted,
    AgentCompleted,
    // Progress notes forwarded from agent message streams
    AgentMessage,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Snapshot => "task.snapshot",
            Self::TaskCreated => "task.created",
            Self::TaskCompleted => "task.completed",
            Self::TaskFailed => "task.failed",
            Self::AgentStarted => "task.agent_started",
            Self::AgentCompleted => "task.agent_completed",
            Self::AgentMessage => "agent.message",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// Server-push event to connected stream subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub type_: String,
    pub event: String,
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            type_: "event".to_string(),
            event: event.into(),
            data,
        }
    }

    /// Task id this event belongs to, used by per-task stream filtering.
    pub fn task_id(&self) -> Option<&str> {
        self.data.get("task_id").and_then(|v| v.as_str())
    }

    /// True for the events that end a task's stream.
    pub fn is_terminal(&self) -> bool {
        self.event == EventType::TaskCompleted.as_str()
            || self.event == EventType::TaskFailed.as_str()
    }

    /// Handshake event sent to every new stream subscriber.
    pub fn connected(task_id: &str) -> Self {
        Self::new(
            EventType::Connected,
            serde_json::json!({
                "task_id": task_id,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }),
        )
    }

    /// Full task state, sent once after `connected` so late subscribers are
    /// not left without state.
    pub fn snapshot(task: &Task) -> Self {
        Self::new(
            EventType::Snapshot,
            serde_json::json!({
                "task_id": task.id,
                "task": task
            }),
        )
    }

    pub fn task_created(task: &Task) -> Self {
        Self::new(
            EventType::TaskCreated,
            serde_json::json!({
                "task_id": task.id,
                "type": task.task_type,
                "status": task.status,
                "workflow": task.workflow
            }),
        )
    }

    pub fn agent_started(task_id: &str, agent_type: &str, step: usize) -> Self {
        Self::new(
            EventType::AgentStarted,
            serde_json::json!({
                "task_id": task_id,
                "agent_type": agent_type,
                "step": step
            }),
        )
    }

    pub fn agent_completed(task_id: &str, agent_type: &str, step: usize, artifact_id: &str) -> Self {
        Self::new(
            EventType::AgentCompleted,
            serde_json::json!({
                "task_id": task_id,
                "agent_type": agent_type,
                "step": step,
                "artifact_id": artifact_id
            }),
        )
    }

    pub fn task_completed(task: &Task) -> Self {
        Self::new(
            EventType::TaskCompleted,
            serde_json::json!({
                "task_id": task.id,
                "status": task.status,
                "artifacts": task.artifacts,
                "task": task
            }),
        )
    }

    /// Explicit failure event carrying the error message, so dashboards can
    /// distinguish "done" from "broke".
    pub fn task_failed(task: &Task, error: &str) -> Self {
        Self::new(
            EventType::TaskFailed,
            serde_json::json!({
                "task_id": task.id,
                "status": task.status,
                "error": error,
                "task": task
            }),
        )
    }

    pub fn agent_message(message: &TaskMessage) -> Self {
        Self::new(
            EventType::AgentMessage,
            serde_json::json!({
                "task_id": message.task_id,
                "message": message
            }),
        )
    }
}
