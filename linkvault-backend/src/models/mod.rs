pub mod agent_card;
pub mod artifact;
pub mod bookmark;
pub mod message;
pub mod task;

pub use agent_card::{json_type_name, AgentCapabilities, AgentCard, FieldType, InputSpec, OutputSpec};
pub use artifact::Artifact;
pub use bookmark::{Bookmark, BookmarkStatus};
pub use message::{MessageType, TaskMessage};
pub use task::{Task, TaskStats, TaskStatus, WorkflowState};
