//! Message outbox - the stream an agent emits progress notes through
//!
//! Agents never write task state; they only publish messages here and
//! return artifacts. The registry subscribes a forwarder to this stream at
//! registration time, which is what routes messages into persistence and
//! the event gateway.

use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::models::{MessageType, TaskMessage};

const CHANNEL_CAPACITY: usize = 256;

pub struct MessageOutbox {
    agent_type: String,
    sender: broadcast::Sender<TaskMessage>,
}

impl MessageOutbox {
    pub fn new(agent_type: &str) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            agent_type: agent_type.to_string(),
            sender,
        }
    }

    /// Attach a receiver to this agent's message stream.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskMessage> {
        self.sender.subscribe()
    }

    /// Publish one message. Messages emitted while nothing is subscribed
    /// (an agent running outside a registry) are dropped.
    pub fn emit(&self, task_id: &str, message_type: MessageType, content: &str, metadata: Value) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        let message = TaskMessage::new(task_id, &self.agent_type, message_type, content, metadata);
        if self.sender.send(message).is_err() {
            log::debug!("Dropped {} message for task {}", self.agent_type, task_id);
        }
    }

    pub fn progress(&self, task_id: &str, content: &str, percent: Option<u32>) {
        let metadata = match percent {
            Some(p) => json!({ "progress": p }),
            None => json!({}),
        };
        self.emit(task_id, MessageType::Progress, content, metadata);
    }

    pub fn status(&self, task_id: &str, content: &str) {
        self.emit(task_id, MessageType::Status, content, json!({}));
    }

    pub fn completion(&self, task_id: &str, content: &str) {
        self.emit(task_id, MessageType::Completion, content, json!({ "progress": 100 }));
    }

    pub fn error(&self, task_id: &str, content: &str) {
        self.emit(task_id, MessageType::Error, content, json!({}));
    }
}
