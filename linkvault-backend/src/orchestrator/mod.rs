//! Task orchestrator - drives each task through its agent sequence
//!
//! State machine per task: pending -> running -> {completed | failed}, both
//! terminal. Many tasks progress concurrently on their own spawned pipeline
//! tasks; within one task, agents run strictly sequentially, so ordering
//! guarantees ("validation only runs after import produced bookmarkIds")
//! hold by construction.
//!
//! The in-memory arena is a write-through cache over SQLite: every mutation
//! hits the database before the arena entry and before any event is
//! broadcast. The orchestrator's advance step is the only writer of task
//! state; agents communicate exclusively through messages and artifacts.

pub mod workflows;

pub use workflows::WorkflowCatalog;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::agents::{Agent, AgentRegistry};
use crate::db::Database;
use crate::error::OrchestratorError;
use crate::gateway::{EventBroadcaster, GatewayEvent};
use crate::models::{AgentCard, Artifact, Task, TaskMessage, TaskStats, TaskStatus};

pub struct TaskOrchestrator {
    db: Arc<Database>,
    registry: Arc<AgentRegistry>,
    broadcaster: Arc<EventBroadcaster>,
    catalog: WorkflowCatalog,
    active_tasks: DashMap<String, Task>,
    message_sink: mpsc::UnboundedSender<TaskMessage>,
}

impl TaskOrchestrator {
    pub fn new(
        db: Arc<Database>,
        registry: Arc<AgentRegistry>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Arc<Self> {
        Self::with_catalog(db, registry, broadcaster, WorkflowCatalog::standard())
    }

    pub fn with_catalog(
        db: Arc<Database>,
        registry: Arc<AgentRegistry>,
        broadcaster: Arc<EventBroadcaster>,
        catalog: WorkflowCatalog,
    ) -> Arc<Self> {
        let (message_sink, message_source) = mpsc::unbounded_channel();

        let orchestrator = Arc::new(Self {
            db: db.clone(),
            registry,
            broadcaster: broadcaster.clone(),
            catalog,
            active_tasks: DashMap::new(),
            message_sink,
        });

        Self::spawn_message_pump(db, broadcaster, message_source);
        orchestrator
    }

    /// Persist every forwarded agent message, then push it to live
    /// subscribers (write-then-notify).
    fn spawn_message_pump(
        db: Arc<Database>,
        broadcaster: Arc<EventBroadcaster>,
        mut source: mpsc::UnboundedReceiver<TaskMessage>,
    ) {
        tokio::spawn(async move {
            while let Some(message) = source.recv().await {
                match db.insert_message(&message) {
                    Ok(stored) => {
                        broadcaster.broadcast(GatewayEvent::agent_message(&stored));
                    }
                    Err(e) => {
                        log::error!(
                            "Failed to persist {} message for task {}: {}",
                            message.agent_type, message.task_id, e
                        );
                    }
                }
            }
        });
    }

    // ============================================
    // Registry passthrough
    // ============================================

    /// Register an agent; its message stream is subscribed into the
    /// orchestrator's persistence and event fan-out.
    pub fn register_agent(&self, agent: Arc<dyn Agent>) -> Result<(), OrchestratorError> {
        self.registry.register(agent, self.message_sink.clone())
    }

    pub fn unregister_agent(&self, agent_type: &str) -> bool {
        self.registry.unregister(agent_type)
    }

    /// Capability cards across the registry, for discovery.
    pub fn get_agent_capabilities(&self) -> Vec<AgentCard> {
        self.registry.cards()
    }

    // ============================================
    // Task lifecycle
    // ============================================

    /// Create a task from a workflow name and initial context, persist it,
    /// and start its pipeline. The pipeline runs on its own tokio task, so
    /// the task may already be running by the time this returns.
    pub fn create_task(
        self: &Arc<Self>,
        workflow_name: &str,
        context: Map<String, Value>,
    ) -> Result<Task, OrchestratorError> {
        let agents = self
            .catalog
            .resolve(workflow_name)
            .ok_or_else(|| OrchestratorError::UnknownWorkflow(workflow_name.to_string()))?
            .to_vec();

        let task = Task::new(workflow_name, agents, context);
        self.db.insert_task(&task)?;
        self.active_tasks.insert(task.id.clone(), task.clone());
        self.broadcaster.broadcast(GatewayEvent::task_created(&task));

        log::info!(
            "Created task {} (workflow {}, {} agents)",
            task.id, workflow_name, task.workflow.agents.len()
        );

        let orchestrator = Arc::clone(self);
        let task_id = task.id.clone();
        tokio::spawn(async move {
            orchestrator.run_pipeline(&task_id).await;
        });

        Ok(task)
    }

    /// Advance a task through its agent sequence until it completes or
    /// fails. Each iteration is one executeNextAgent step.
    async fn run_pipeline(&self, task_id: &str) {
        loop {
            let Some(task) = self.active_tasks.get(task_id).map(|t| t.value().clone()) else {
                log::warn!("Pipeline for task {} lost its arena entry", task_id);
                return;
            };

            if task.workflow.is_exhausted() {
                if let Err(e) = self.complete_task(task) {
                    log::error!("Failed to complete task {}: {}", task_id, e);
                }
                return;
            }

            let agent_type = task.workflow.agents[task.workflow.current_step].clone();
            let Some(agent) = self.registry.get(&agent_type) else {
                // Fatal for the task, not retried: the catalog references an
                // agent this process does not have.
                let error = OrchestratorError::AgentNotRegistered(agent_type.clone());
                self.fail_task(task_id, &error.to_string());
                return;
            };

            let task = match self.mark_step_started(task, &agent_type) {
                Ok(task) => task,
                Err(e) => {
                    log::error!("Failed to persist step start for task {}: {}", task_id, e);
                    self.fail_task(task_id, &e.to_string());
                    return;
                }
            };

            match agent.process_task(&task).await {
                Ok(outcome) => {
                    if let Err(e) = self.advance_after_success(task, outcome.artifacts) {
                        log::error!("Failed to persist step result for task {}: {}", task_id, e);
                        self.fail_task(task_id, &e.to_string());
                        return;
                    }
                }
                Err(e) => {
                    self.fail_task(task_id, &e.to_string());
                    return;
                }
            }
        }
    }

    /// Transition to running (first step) and point at the current agent.
    fn mark_step_started(
        &self,
        mut task: Task,
        agent_type: &str,
    ) -> Result<Task, OrchestratorError> {
        task.status = TaskStatus::Running;
        task.workflow.current_agent = Some(agent_type.to_string());
        task.updated_at = Utc::now();

        self.db.update_task(&task)?;
        self.active_tasks.insert(task.id.clone(), task.clone());
        self.broadcaster.broadcast(GatewayEvent::agent_started(
            &task.id,
            agent_type,
            task.workflow.current_step,
        ));
        Ok(task)
    }

    /// Persist the step's artifacts, merge their output into the context,
    /// and advance the step index.
    fn advance_after_success(
        &self,
        mut task: Task,
        artifacts: Vec<Artifact>,
    ) -> Result<(), OrchestratorError> {
        let step = task.workflow.current_step;
        let agent_type = task.workflow.current_agent.clone().unwrap_or_default();

        for artifact in &artifacts {
            self.db.insert_artifact(artifact)?;
            task.artifacts.push(artifact.id.clone());
            task.merge_context(&artifact.data);
        }

        task.workflow.current_step += 1;
        task.workflow.current_agent = None;
        task.metadata.insert(
            "progress".to_string(),
            json!(task.workflow.progress_percent()),
        );
        task.updated_at = Utc::now();

        self.db.update_task(&task)?;
        self.active_tasks.insert(task.id.clone(), task.clone());

        for artifact in &artifacts {
            self.broadcaster.broadcast(GatewayEvent::agent_completed(
                &task.id,
                &agent_type,
                step,
                &artifact.id,
            ));
        }
        Ok(())
    }

    /// Terminal success: every agent in the sequence has completed.
    fn complete_task(&self, mut task: Task) -> Result<(), OrchestratorError> {
        task.status = TaskStatus::Completed;
        task.workflow.current_agent = None;
        task.metadata.insert("progress".to_string(), json!(100));
        task.updated_at = Utc::now();

        self.db.update_task(&task)?;
        self.active_tasks.remove(&task.id);
        self.broadcaster.broadcast(GatewayEvent::task_completed(&task));

        log::info!("Task {} completed ({} artifacts)", task.id, task.artifacts.len());
        Ok(())
    }

    /// Terminal failure: record the error on the task and stop the
    /// pipeline. The failure is isolated to this task.
    fn fail_task(&self, task_id: &str, error_message: &str) {
        let task = self
            .active_tasks
            .get(task_id)
            .map(|t| t.value().clone())
            .or_else(|| self.db.get_task(task_id).ok().flatten());
        let Some(mut task) = task else {
            log::error!("Cannot fail unknown task {}", task_id);
            return;
        };

        task.mark_failed(error_message);
        if let Err(e) = self.db.update_task(&task) {
            log::error!("Failed to persist failure of task {}: {}", task_id, e);
        }
        self.active_tasks.remove(task_id);
        self.broadcaster
            .broadcast(GatewayEvent::task_failed(&task, error_message));

        log::warn!("Task {} failed: {}", task_id, error_message);
    }

    // ============================================
    // Read paths
    // ============================================

    /// Read a task: the arena is authoritative for in-flight tasks, the
    /// database holds terminal ones.
    pub fn get_task(&self, task_id: &str) -> Result<Task, OrchestratorError> {
        if let Some(task) = self.active_tasks.get(task_id) {
            return Ok(task.value().clone());
        }
        self.db
            .get_task(task_id)?
            .ok_or_else(|| OrchestratorError::NotFound(format!("task {}", task_id)))
    }

    /// Ordered artifacts for a task.
    pub fn list_artifacts(&self, task_id: &str) -> Result<Vec<Artifact>, OrchestratorError> {
        // existence check keeps unknown ids a 404, not an empty list
        self.get_task(task_id)?;
        Ok(self.db.list_artifacts_for_task(task_id)?)
    }

    /// Messages for a task, optionally after a timestamp cursor.
    pub fn list_messages(
        &self,
        task_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<TaskMessage>, OrchestratorError> {
        self.get_task(task_id)?;
        Ok(self.db.list_messages_for_task(task_id, since)?)
    }

    /// Aggregate counts by status; a read-only view, never a source of
    /// truth for task state.
    pub fn get_task_stats(&self) -> Result<TaskStats, OrchestratorError> {
        Ok(self.db.count_tasks_by_status()?)
    }

    pub fn workflow_names(&self) -> Vec<String> {
        self.catalog.names()
    }
}
