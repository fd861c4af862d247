//! Task row read/write paths
//!
//! The orchestrator writes a task row before any in-memory or event-gateway
//! update becomes visible (write-then-notify), so a crash between "agent
//! returned" and "event emitted" loses at most the live notification.

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;
use serde_json::{Map, Value};

use super::super::Database;
use crate::models::{Task, TaskStats, TaskStatus, WorkflowState};

const TASK_COLUMNS: &str = "id, type, status, context, metadata, workflow_type, workflow_agents, current_step, created_at, updated_at";

impl Database {
    /// Insert a freshly created task row.
    pub fn insert_task(&self, task: &Task) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tasks (id, type, status, context, metadata, workflow_type, workflow_agents, current_step, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                &task.id,
                &task.task_type,
                task.status.as_str(),
                serde_json::to_string(&task.context).unwrap_or_else(|_| "{}".to_string()),
                serde_json::to_string(&task.metadata).unwrap_or_else(|_| "{}".to_string()),
                &task.task_type,
                serde_json::to_string(&task.workflow.agents).unwrap_or_else(|_| "[]".to_string()),
                task.workflow.current_step as i64,
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Persist the mutable columns of a task after an advance step. The
    /// snapshotted agent list and creation time never change.
    pub fn update_task(&self, task: &Task) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE tasks SET status = ?1, context = ?2, metadata = ?3, current_step = ?4, updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                task.status.as_str(),
                serde_json::to_string(&task.context).unwrap_or_else(|_| "{}".to_string()),
                serde_json::to_string(&task.metadata).unwrap_or_else(|_| "{}".to_string()),
                task.workflow.current_step as i64,
                task.updated_at.to_rfc3339(),
                &task.id,
            ],
        )?;
        Ok(())
    }

    /// Get a task by id, rebuilding its artifact id list from the
    /// artifacts table.
    pub fn get_task(&self, id: &str) -> SqliteResult<Option<Task>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS))?;
        let task = stmt.query_row([id], |row| Self::row_to_task(row)).ok();

        let Some(mut task) = task else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id FROM artifacts WHERE task_id = ?1 ORDER BY created_at, rowid",
        )?;
        task.artifacts = stmt
            .query_map([id], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(Some(task))
    }

    /// Aggregate task counts by status.
    pub fn count_tasks_by_status(&self) -> SqliteResult<TaskStats> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = TaskStats::default();
        for row in rows.filter_map(|r| r.ok()) {
            let (status, count) = row;
            let count = count as usize;
            stats.total += count;
            match TaskStatus::from_str(&status) {
                Some(TaskStatus::Pending) => stats.pending += count,
                Some(TaskStatus::Running) => stats.running += count,
                Some(TaskStatus::Completed) => stats.completed += count,
                Some(TaskStatus::Failed) => stats.failed += count,
                None => {}
            }
        }

        Ok(stats)
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let context_str: String = row.get(3)?;
        let metadata_str: String = row.get(4)?;
        let agents_str: String = row.get(6)?;
        let status_str: String = row.get(2)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        let agents: Vec<String> = serde_json::from_str(&agents_str).unwrap_or_default();
        let current_step = row.get::<_, i64>(7)? as usize;
        let current_agent = if current_step < agents.len()
            && status_str == TaskStatus::Running.as_str()
        {
            Some(agents[current_step].clone())
        } else {
            None
        };

        Ok(Task {
            id: row.get(0)?,
            task_type: row.get(1)?,
            status: TaskStatus::from_str(&status_str).unwrap_or_default(),
            context: serde_json::from_str::<Map<String, Value>>(&context_str)
                .unwrap_or_default(),
            workflow: WorkflowState {
                agents,
                current_step,
                current_agent,
            },
            artifacts: Vec::new(),
            metadata: serde_json::from_str::<Map<String, Value>>(&metadata_str)
                .unwrap_or_default(),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}
