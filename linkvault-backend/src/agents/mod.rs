//! Agent contract and implementations
//!
//! Every pipeline stage implements the [`Agent`] trait: a capability card
//! for discovery, input validation against that card, and an async
//! `execute` doing the domain work. `process_task` is the template the
//! orchestrator drives; agents communicate outward only through their
//! message outbox and the returned artifact, never by writing task state.

pub mod builtin;
pub mod outbox;
pub mod registry;

pub use outbox::MessageOutbox;
pub use registry::AgentRegistry;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::db::Database;
use crate::error::OrchestratorError;
use crate::models::{json_type_name, AgentCard, Artifact, Task, TaskStatus};
use crate::orchestrator::TaskOrchestrator;

/// What `process_task` hands back to the orchestrator.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: TaskStatus,
    pub artifacts: Vec<Artifact>,
}

#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique agent-type name; the registry key.
    fn agent_type(&self) -> &str;

    /// Capability descriptor. Pure and side-effect free.
    fn card(&self) -> AgentCard;

    /// The stream this agent emits progress messages through.
    fn outbox(&self) -> &MessageOutbox;

    /// The agent's domain action. Uses `task.context`, returns the output
    /// payload that becomes the artifact data and is merged into the context
    /// for the next agent.
    async fn execute(&self, task: &Task) -> Result<Value, OrchestratorError>;

    /// Check the context against the card's declared inputs: required fields
    /// must be present, and any present declared field must match its
    /// declared runtime type. Optional absent fields are not checked.
    fn validate_inputs(&self, context: &Map<String, Value>) -> Result<(), OrchestratorError> {
        let card = self.card();
        for (field, spec) in &card.capabilities.inputs {
            match context.get(field) {
                None => {
                    if spec.required {
                        return Err(OrchestratorError::missing_input(field.clone()));
                    }
                }
                Some(value) => {
                    if !spec.field_type.matches(value) {
                        return Err(OrchestratorError::input_type_mismatch(
                            field.clone(),
                            spec.field_type.as_str(),
                            json_type_name(value),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Stamp an output payload into an immutable artifact.
    fn create_artifact(&self, data: Value, task_id: &str) -> Artifact {
        Artifact::new(self.agent_type(), task_id, data)
    }

    /// Template operation the orchestrator calls: validate, announce start,
    /// execute, wrap the output into exactly one artifact, announce
    /// completion. On any failure an error message is emitted and the error
    /// is rethrown; the caller decides what happens to the task.
    async fn process_task(&self, task: &Task) -> Result<ProcessOutcome, OrchestratorError> {
        if let Err(e) = self.validate_inputs(&task.context) {
            self.outbox().error(&task.id, &e.to_string());
            return Err(e);
        }

        self.outbox().progress(
            &task.id,
            &format!("{} agent started", self.agent_type()),
            Some(0),
        );

        match self.execute(task).await {
            Ok(output) => {
                let artifact = self.create_artifact(output, &task.id);
                self.outbox()
                    .completion(&task.id, &format!("{} agent completed", self.agent_type()));
                Ok(ProcessOutcome {
                    status: TaskStatus::Completed,
                    artifacts: vec![artifact],
                })
            }
            Err(e) => {
                self.outbox().error(&task.id, &e.to_string());
                Err(e)
            }
        }
    }
}

/// Read a string-array context field (e.g. `bookmarkIds`).
pub(crate) fn context_string_array(context: &Map<String, Value>, key: &str) -> Vec<String> {
    context
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Register the five built-in pipeline agents with the orchestrator.
pub fn register_default_agents(
    orchestrator: &TaskOrchestrator,
    db: Arc<Database>,
) -> Result<usize, OrchestratorError> {
    orchestrator.register_agent(Arc::new(builtin::ImportAgent::new(db.clone())))?;
    orchestrator.register_agent(Arc::new(builtin::ValidationAgent::new(db.clone())))?;
    orchestrator.register_agent(Arc::new(builtin::EnrichmentAgent::new(db.clone())))?;
    orchestrator.register_agent(Arc::new(builtin::CategorizationAgent::new(db.clone())))?;
    orchestrator.register_agent(Arc::new(builtin::EmbeddingAgent::new(db)))?;
    Ok(5)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{AgentCapabilities, OutputSpec};
    use serde_json::json;
    use std::collections::BTreeMap;

    /// Minimal agent for registry/orchestrator tests: configurable type,
    /// canned output or failure.
    pub struct StubAgent {
        agent_type: String,
        outbox: MessageOutbox,
        output: Value,
        failure: Option<String>,
    }

    impl StubAgent {
        pub fn new(agent_type: &str) -> Self {
            Self::with_output(agent_type, json!({ "ok": true }))
        }

        pub fn with_output(agent_type: &str, output: Value) -> Self {
            Self {
                agent_type: agent_type.to_string(),
                outbox: MessageOutbox::new(agent_type),
                output,
                failure: None,
            }
        }

        pub fn failing(agent_type: &str, error: &str) -> Self {
            Self {
                agent_type: agent_type.to_string(),
                outbox: MessageOutbox::new(agent_type),
                output: Value::Null,
                failure: Some(error.to_string()),
            }
        }
    }

    #[async_trait]
    impl Agent for StubAgent {
        fn agent_type(&self) -> &str {
            &self.agent_type
        }

        fn card(&self) -> AgentCard {
            AgentCard::new(
                &self.agent_type,
                "0.0.1",
                AgentCapabilities {
                    description: format!("stub {} agent", self.agent_type),
                    inputs: BTreeMap::new(),
                    outputs: OutputSpec {
                        output_type: format!("{}_result", self.agent_type),
                        schema: json!({}),
                    },
                    actions: vec![],
                },
            )
        }

        fn outbox(&self) -> &MessageOutbox {
            &self.outbox
        }

        async fn execute(&self, _task: &Task) -> Result<Value, OrchestratorError> {
            match &self.failure {
                Some(error) => Err(OrchestratorError::AgentExecution(error.clone())),
                None => Ok(self.output.clone()),
            }
        }
    }

}
