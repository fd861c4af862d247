//! Import agent - parses a Netscape-format bookmark file into bookmark rows

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agents::{Agent, MessageOutbox};
use crate::db::Database;
use crate::error::OrchestratorError;
use crate::models::{
    AgentCapabilities, AgentCard, Bookmark, FieldType, InputSpec, OutputSpec, Task,
};

pub struct ImportAgent {
    db: Arc<Database>,
    outbox: MessageOutbox,
    anchor_pattern: Regex,
}

impl ImportAgent {
    pub const AGENT_TYPE: &'static str = "import";

    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            outbox: MessageOutbox::new(Self::AGENT_TYPE),
            // Netscape bookmark exports wrap every entry in an <A HREF> anchor
            anchor_pattern: Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#)
                .unwrap(),
        }
    }
}

#[async_trait]
impl Agent for ImportAgent {
    fn agent_type(&self) -> &str {
        Self::AGENT_TYPE
    }

    fn card(&self) -> AgentCard {
        let mut inputs = BTreeMap::new();
        inputs.insert("filePath".to_string(), InputSpec::required(FieldType::String));
        inputs.insert("userId".to_string(), InputSpec::required(FieldType::String));
        AgentCard::new(
            Self::AGENT_TYPE,
            "1.0.0",
            AgentCapabilities {
                description: "Parses an exported bookmark file and inserts bookmark rows"
                    .to_string(),
                inputs,
                outputs: OutputSpec {
                    output_type: "import_result".to_string(),
                    schema: json!({
                        "bookmarkIds": "array",
                        "totalBookmarks": "number",
                        "insertedCount": "number"
                    }),
                },
                actions: vec!["parse_file".to_string(), "import_bookmarks".to_string()],
            },
        )
    }

    fn outbox(&self) -> &MessageOutbox {
        &self.outbox
    }

    async fn execute(&self, task: &Task) -> Result<Value, OrchestratorError> {
        let file_path = task
            .context
            .get("filePath")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let user_id = task
            .context
            .get("userId")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        let html = tokio::fs::read_to_string(file_path).await.map_err(|e| {
            OrchestratorError::AgentExecution(format!("failed to read {}: {}", file_path, e))
        })?;

        let mut bookmark_ids: Vec<String> = Vec::new();
        let mut total_bookmarks = 0usize;

        for caps in self.anchor_pattern.captures_iter(&html) {
            total_bookmarks += 1;

            let url = caps[1].trim().to_string();
            if !url.starts_with("http://") && !url.starts_with("https://") {
                continue;
            }

            let title = caps[2].trim();
            let title = if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            };

            let bookmark = Bookmark::new(user_id, &url, title);
            self.db.insert_bookmark(&bookmark)?;
            bookmark_ids.push(bookmark.id);

            if bookmark_ids.len() % 25 == 0 {
                self.outbox.progress(
                    &task.id,
                    &format!("imported {} bookmarks", bookmark_ids.len()),
                    None,
                );
            }
        }

        log::info!(
            "Imported {}/{} bookmarks from {} for user {}",
            bookmark_ids.len(),
            total_bookmarks,
            file_path,
            user_id
        );

        Ok(json!({
            "bookmarkIds": bookmark_ids,
            "totalBookmarks": total_bookmarks,
            "insertedCount": bookmark_ids.len()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use std::io::Write;

    fn task_with_file(path: &str) -> Task {
        let mut context = Map::new();
        context.insert("filePath".to_string(), json!(path));
        context.insert("userId".to_string(), json!("u1"));
        Task::new("quick_import", vec!["import".to_string()], context)
    }

    #[tokio::test]
    async fn test_import_parses_anchors_and_inserts_rows() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"<DL><p>
                <DT><A HREF="https://example.com/a" ADD_DATE="170">Example A</A>
                <DT><A HREF="https://example.com/b">Example B</A>
                <DT><A HREF="ftp://example.com/skip">Skipped</A>
            </DL>"#
        )
        .unwrap();

        let agent = ImportAgent::new(db.clone());
        let task = task_with_file(file.path().to_str().unwrap());
        let output = agent.execute(&task).await.unwrap();

        assert_eq!(output["totalBookmarks"], json!(3));
        assert_eq!(output["insertedCount"], json!(2));

        let ids: Vec<String> = output["bookmarkIds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        let stored = db.get_bookmarks_by_ids(&ids).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].title.as_deref(), Some("Example A"));
        assert_eq!(stored[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_import_missing_file_fails_with_execution_error() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let agent = ImportAgent::new(db);
        let task = task_with_file("/nonexistent/bookmarks.html");

        let err = agent.execute(&task).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::AgentExecution(_)));
        assert!(err.to_string().contains("/nonexistent/bookmarks.html"));
    }

    #[tokio::test]
    async fn test_process_task_requires_declared_inputs() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let agent = ImportAgent::new(db);

        let mut context = Map::new();
        context.insert("userId".to_string(), json!("u1"));
        let task = Task::new("quick_import", vec!["import".to_string()], context);

        let err = agent.process_task(&task).await.unwrap_err();
        assert!(err.to_string().contains("filePath"));
    }
}
