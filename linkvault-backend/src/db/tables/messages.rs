//! Task message database operations
//!
//! Messages are append-only. Reads order by (timestamp, id) so bursts inside
//! one millisecond keep a stable order; the `since` cursor stays on the
//! timestamp column for incremental polling.

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;
use serde_json::Value;

use super::super::Database;
use crate::models::{MessageType, TaskMessage};

impl Database {
    /// Append a message, returning it with the assigned row id.
    pub fn insert_message(&self, message: &TaskMessage) -> SqliteResult<TaskMessage> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO task_messages (task_id, agent_type, type, content, metadata, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &message.task_id,
                &message.agent_type,
                message.message_type.as_str(),
                &message.content,
                serde_json::to_string(&message.metadata).unwrap_or_else(|_| "{}".to_string()),
                message.timestamp.to_rfc3339(),
            ],
        )?;

        let mut stored = message.clone();
        stored.id = conn.last_insert_rowid();
        Ok(stored)
    }

    /// List messages for a task, optionally filtered to those strictly after
    /// the given timestamp.
    pub fn list_messages_for_task(
        &self,
        task_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> SqliteResult<Vec<TaskMessage>> {
        let conn = self.conn.lock().unwrap();

        let messages = match since {
            Some(since) => {
                let mut stmt = conn.prepare(
                    "SELECT id, task_id, agent_type, type, content, metadata, timestamp
                     FROM task_messages WHERE task_id = ?1 AND timestamp > ?2
                     ORDER BY timestamp, id",
                )?;
                stmt.query_map(
                    rusqlite::params![task_id, since.to_rfc3339()],
                    |row| Self::row_to_message(row),
                )?
                .filter_map(|r| r.ok())
                .collect()
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, task_id, agent_type, type, content, metadata, timestamp
                     FROM task_messages WHERE task_id = ?1 ORDER BY timestamp, id",
                )?;
                stmt.query_map([task_id], |row| Self::row_to_message(row))?
                    .filter_map(|r| r.ok())
                    .collect()
            }
        };

        Ok(messages)
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<TaskMessage> {
        let type_str: String = row.get(3)?;
        let metadata_str: String = row.get(5)?;
        let timestamp_str: String = row.get(6)?;

        Ok(TaskMessage {
            id: row.get(0)?,
            task_id: row.get(1)?,
            agent_type: row.get(2)?,
            message_type: MessageType::from_str(&type_str).unwrap_or(MessageType::Status),
            content: row.get(4)?,
            metadata: serde_json::from_str::<Value>(&metadata_str)
                .unwrap_or(Value::Object(Default::default())),
            timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
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
    fn test_messages_ordered_and_filterable_by_since() {
        let db = test_db();
        let task = Task::new("quick_import", vec![], Default::default());
        db.insert_task(&task).unwrap();

        let first = db
            .insert_message(&TaskMessage::new(
                &task.id,
                "import",
                MessageType::Progress,
                "started",
                json!({"progress": 0}),
            ))
            .unwrap();
        let second = db
            .insert_message(&TaskMessage::new(
                &task.id,
                "import",
                MessageType::Completion,
                "done",
                json!({"progress": 100}),
            ))
            .unwrap();
        assert!(second.id > first.id);

        let all = db.list_messages_for_task(&task.id, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "started");
        assert_eq!(all[1].content, "done");

        // strictly-after cursor on the first message's timestamp
        let later = db
            .list_messages_for_task(&task.id, Some(first.timestamp))
            .unwrap();
        assert!(later.iter().all(|m| m.timestamp > first.timestamp));
    }

    #[test]
    fn test_messages_scoped_to_task() {
        let db = test_db();
        let a = Task::new("quick_import", vec![], Default::default());
        let b = Task::new("quick_import", vec![], Default::default());
        db.insert_task(&a).unwrap();
        db.insert_task(&b).unwrap();

        db.insert_message(&TaskMessage::new(
            &a.id,
            "import",
            MessageType::Status,
            "only for a",
            json!({}),
        ))
        .unwrap();

        assert_eq!(db.list_messages_for_task(&a.id, None).unwrap().len(), 1);
        assert!(db.list_messages_for_task(&b.id, None).unwrap().is_empty());
    }
}
