//! Validation agent - checks bookmark URLs and records verdicts

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::agents::{context_string_array, Agent, MessageOutbox};
use crate::db::Database;
use crate::error::OrchestratorError;
use crate::models::{
    AgentCapabilities, AgentCard, BookmarkStatus, FieldType, InputSpec, OutputSpec, Task,
};

const LIVENESS_TIMEOUT_SECS: u64 = 5;

pub struct ValidationAgent {
    db: Arc<Database>,
    outbox: MessageOutbox,
    http: reqwest::Client,
}

impl ValidationAgent {
    pub const AGENT_TYPE: &'static str = "validation";

    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            outbox: MessageOutbox::new(Self::AGENT_TYPE),
            http: reqwest::Client::new(),
        }
    }

    /// Syntactic check: parseable http(s) URL with a host.
    fn is_well_formed(url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => {
                matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
            }
            Err(_) => false,
        }
    }

    /// Optional liveness probe. Any transport error or 4xx/5xx counts as
    /// dead; the probe carries its own timeout so a hanging server cannot
    /// stall the pipeline indefinitely.
    async fn is_reachable(&self, url: &str) -> bool {
        match self
            .http
            .head(url)
            .timeout(Duration::from_secs(LIVENESS_TIMEOUT_SECS))
            .send()
            .await
        {
            Ok(response) => response.status().is_success() || response.status().is_redirection(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Agent for ValidationAgent {
    fn agent_type(&self) -> &str {
        Self::AGENT_TYPE
    }

    fn card(&self) -> AgentCard {
        let mut inputs = BTreeMap::new();
        inputs.insert("bookmarkIds".to_string(), InputSpec::required(FieldType::Array));
        inputs.insert(
            "checkLiveness".to_string(),
            InputSpec::optional(FieldType::Boolean),
        );
        AgentCard::new(
            Self::AGENT_TYPE,
            "1.0.0",
            AgentCapabilities {
                description: "Validates bookmark URLs and marks each row valid or invalid"
                    .to_string(),
                inputs,
                outputs: OutputSpec {
                    output_type: "validation_result".to_string(),
                    schema: json!({
                        "validCount": "number",
                        "invalidCount": "number",
                        "bookmarkIds": "array"
                    }),
                },
                actions: vec!["validate_urls".to_string()],
            },
        )
    }

    fn outbox(&self) -> &MessageOutbox {
        &self.outbox
    }

    async fn execute(&self, task: &Task) -> Result<Value, OrchestratorError> {
        let ids = context_string_array(&task.context, "bookmarkIds");
        let check_liveness = task
            .context
            .get("checkLiveness")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let bookmarks = self.db.get_bookmarks_by_ids(&ids)?;
        let total = bookmarks.len();
        let mut valid_count = 0usize;
        let mut invalid_count = 0usize;

        for (index, bookmark) in bookmarks.iter().enumerate() {
            let mut valid = Self::is_well_formed(&bookmark.url);
            if valid && check_liveness {
                valid = self.is_reachable(&bookmark.url).await;
            }

            let status = if valid {
                valid_count += 1;
                BookmarkStatus::Valid
            } else {
                invalid_count += 1;
                BookmarkStatus::Invalid
            };
            self.db.update_bookmark_status(&bookmark.id, status)?;

            if (index + 1) % 10 == 0 {
                self.outbox.progress(
                    &task.id,
                    &format!("validated {}/{} bookmarks", index + 1, total),
                    Some(((index + 1) * 100 / total) as u32),
                );
            }
        }

        Ok(json!({
            "validCount": valid_count,
            "invalidCount": invalid_count,
            "bookmarkIds": ids
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bookmark;
    use serde_json::Map;

    fn task_with_ids(ids: &[String]) -> Task {
        let mut context = Map::new();
        context.insert("bookmarkIds".to_string(), json!(ids));
        Task::new("validation_only", vec!["validation".to_string()], context)
    }

    #[test]
    fn test_well_formed_urls() {
        assert!(ValidationAgent::is_well_formed("https://example.com/a"));
        assert!(ValidationAgent::is_well_formed("http://example.com"));
        assert!(!ValidationAgent::is_well_formed("ftp://example.com"));
        assert!(!ValidationAgent::is_well_formed("not a url"));
        assert!(!ValidationAgent::is_well_formed("https://"));
    }

    #[tokio::test]
    async fn test_validation_marks_rows_and_counts() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let good = Bookmark::new("u1", "https://example.com/good", None);
        let bad = Bookmark::new("u1", "nonsense://nope", None);
        db.insert_bookmark(&good).unwrap();
        db.insert_bookmark(&bad).unwrap();

        let agent = ValidationAgent::new(db.clone());
        let task = task_with_ids(&[good.id.clone(), bad.id.clone()]);
        let output = agent.execute(&task).await.unwrap();

        assert_eq!(output["validCount"], json!(1));
        assert_eq!(output["invalidCount"], json!(1));
        assert_eq!(output["bookmarkIds"].as_array().unwrap().len(), 2);

        assert_eq!(
            db.get_bookmark(&good.id).unwrap().unwrap().status,
            BookmarkStatus::Valid
        );
        assert_eq!(
            db.get_bookmark(&bad.id).unwrap().unwrap().status,
            BookmarkStatus::Invalid
        );
    }

    #[tokio::test]
    async fn test_validation_requires_bookmark_ids() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let agent = ValidationAgent::new(db);
        let task = Task::new("validation_only", vec!["validation".to_string()], Map::new());

        let err = agent.process_task(&task).await.unwrap_err();
        assert!(err.to_string().contains("bookmarkIds"));
    }
}
