//! Agent registry - maps agent-type name to a live agent instance
//!
//! Registration subscribes a forwarder task to the agent's message stream so
//! everything the agent emits flows into the orchestrator's sink (persistence
//! plus event gateway). Re-registering an agent type replaces the previous
//! instance and its forwarder, which allows hot-swapping an agent
//! implementation without a restart. Unregistering detaches the forwarder but
//! does not cancel an in-flight execute call.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Agent;
use crate::error::OrchestratorError;
use crate::models::{AgentCard, TaskMessage};

struct RegisteredAgent {
    agent: Arc<dyn Agent>,
    forwarder: JoinHandle<()>,
}

pub struct AgentRegistry {
    agents: RwLock<HashMap<String, RegisteredAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Register an agent under its self-declared type. Fails before any
    /// state mutation if the candidate declares no agent type.
    pub fn register(
        &self,
        agent: Arc<dyn Agent>,
        sink: mpsc::UnboundedSender<TaskMessage>,
    ) -> Result<(), OrchestratorError> {
        let agent_type = agent.agent_type().trim().to_string();
        if agent_type.is_empty() {
            return Err(OrchestratorError::MissingAgentType);
        }

        let mut stream = agent.outbox().subscribe();
        let forwarder_type = agent_type.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                match stream.recv().await {
                    Ok(message) => {
                        if sink.send(message).is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            "{} message stream lagged, skipped {} messages",
                            forwarder_type, skipped
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let previous = self
            .agents
            .write()
            .insert(agent_type.clone(), RegisteredAgent { agent, forwarder });
        if let Some(previous) = previous {
            previous.forwarder.abort();
            log::info!("Replaced registered agent: {}", agent_type);
        } else {
            log::info!("Registered agent: {}", agent_type);
        }
        Ok(())
    }

    /// Remove an agent and detach its message subscription. Returns false if
    /// the type was not registered.
    pub fn unregister(&self, agent_type: &str) -> bool {
        match self.agents.write().remove(agent_type) {
            Some(entry) => {
                entry.forwarder.abort();
                log::info!("Unregistered agent: {}", agent_type);
                true
            }
            None => false,
        }
    }

    /// Look up an agent by type.
    pub fn get(&self, agent_type: &str) -> Option<Arc<dyn Agent>> {
        self.agents.read().get(agent_type).map(|e| e.agent.clone())
    }

    /// Capability cards for every registered agent, sorted by name so the
    /// discovery document is stable.
    pub fn cards(&self) -> Vec<AgentCard> {
        let mut cards: Vec<AgentCard> = self
            .agents
            .read()
            .values()
            .map(|e| e.agent.card())
            .collect();
        cards.sort_by(|a, b| a.name.cmp(&b.name));
        cards
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
