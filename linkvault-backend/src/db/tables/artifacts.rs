//! Artifact database operations
//!
//! Artifacts are insert-only: there is deliberately no update or delete path.

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;
use serde_json::Value;

use super::super::Database;
use crate::models::Artifact;

impl Database {
    /// Insert one agent output artifact.
    pub fn insert_artifact(&self, artifact: &Artifact) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO artifacts (id, task_id, agent_type, type, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &artifact.id,
                &artifact.task_id,
                &artifact.agent_type,
                &artifact.artifact_type,
                serde_json::to_string(&artifact.data).unwrap_or_else(|_| "{}".to_string()),
                artifact.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get a single artifact by id.
    pub fn get_artifact(&self, id: &str) -> SqliteResult<Option<Artifact>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, agent_type, type, data, created_at
             FROM artifacts WHERE id = ?1",
        )?;
        let artifact = stmt.query_row([id], |row| Self::row_to_artifact(row)).ok();
        Ok(artifact)
    }

    /// List artifacts for a task in the order agents completed, which
    /// equals workflow order.
    pub fn list_artifacts_for_task(&self, task_id: &str) -> SqliteResult<Vec<Artifact>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, task_id, agent_type, type, data, created_at
             FROM artifacts WHERE task_id = ?1 ORDER BY created_at, rowid",
        )?;
        let artifacts = stmt
            .query_map([task_id], |row| Self::row_to_artifact(row))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(artifacts)
    }

    fn row_to_artifact(row: &rusqlite::Row) -> rusqlite::Result<Artifact> {
        let data_str: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;

        Ok(Artifact {
            id: row.get(0)?,
            task_id: row.get(1)?,
            agent_type: row.get(2)?,
            artifact_type: row.get(3)?,
            data: serde_json::from_str::<Value>(&data_str).unwrap_or(Value::Null),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use serde_json::json;

    fn test_db() -> Database {
        Database::new(":memory:").unwrap()
    }

    #[test]
    fn test_artifacts_come_back_in_insertion_order() {
        let db = test_db();
        let task = Task::new("full_import", vec![], Default::default());
        db.insert_task(&task).unwrap();

        let first = Artifact::new("import", &task.id, json!({"bookmarkIds": ["bm-1"]}));
        let second = Artifact::new("validation", &task.id, json!({"validCount": 1}));
        db.insert_artifact(&first).unwrap();
        db.insert_artifact(&second).unwrap();

        let listed = db.list_artifacts_for_task(&task.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].agent_type, "import");
        assert_eq!(listed[1].agent_type, "validation");
    }

    #[test]
    fn test_rereading_an_artifact_yields_same_data() {
        let db = test_db();
        let task = Task::new("quick_import", vec![], Default::default());
        db.insert_task(&task).unwrap();

        let artifact = Artifact::new("import", &task.id, json!({"totalBookmarks": 7}));
        db.insert_artifact(&artifact).unwrap();

        let a = db.get_artifact(&artifact.id).unwrap().unwrap();
        let b = db.get_artifact(&artifact.id).unwrap().unwrap();
        assert_eq!(a.data, b.data);
        assert_eq!(a.data["totalBookmarks"], json!(7));
    }
}
