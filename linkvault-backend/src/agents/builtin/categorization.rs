//! Categorization agent - assigns a category from static domain rules

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::agents::{context_string_array, Agent, MessageOutbox};
use crate::db::Database;
use crate::error::OrchestratorError;
use crate::models::{AgentCapabilities, AgentCard, FieldType, InputSpec, OutputSpec, Task};

const DEFAULT_CATEGORY: &str = "unsorted";

/// Substring rules applied to the bookmark's domain (or full URL when the
/// domain is missing). First match wins.
static CATEGORY_RULES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("github.", "development"),
        ("gitlab.", "development"),
        ("stackoverflow.", "development"),
        ("docs.rs", "development"),
        ("crates.io", "development"),
        ("youtube.", "video"),
        ("vimeo.", "video"),
        ("twitch.", "video"),
        ("twitter.", "social"),
        ("x.com", "social"),
        ("reddit.", "social"),
        ("mastodon.", "social"),
        ("linkedin.", "social"),
        ("wikipedia.", "reference"),
        ("arxiv.", "reference"),
        ("news.", "news"),
        ("bbc.", "news"),
        ("nytimes.", "news"),
        ("theguardian.", "news"),
        ("amazon.", "shopping"),
        ("ebay.", "shopping"),
    ]
});

pub struct CategorizationAgent {
    db: Arc<Database>,
    outbox: MessageOutbox,
}

impl CategorizationAgent {
    pub const AGENT_TYPE: &'static str = "categorization";

    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            outbox: MessageOutbox::new(Self::AGENT_TYPE),
        }
    }

    fn categorize(subject: &str) -> &'static str {
        let subject = subject.to_lowercase();
        CATEGORY_RULES
            .iter()
            .find(|(needle, _)| subject.contains(needle))
            .map(|(_, category)| *category)
            .unwrap_or(DEFAULT_CATEGORY)
    }
}

#[async_trait]
impl Agent for CategorizationAgent {
    fn agent_type(&self) -> &str {
        Self::AGENT_TYPE
    }

    fn card(&self) -> AgentCard {
        let mut inputs = BTreeMap::new();
        inputs.insert("bookmarkIds".to_string(), InputSpec::required(FieldType::Array));
        AgentCard::new(
            Self::AGENT_TYPE,
            "1.0.0",
            AgentCapabilities {
                description: "Assigns a category to each bookmark from domain rules".to_string(),
                inputs,
                outputs: OutputSpec {
                    output_type: "categorization_result".to_string(),
                    schema: json!({
                        "categorized": "number",
                        "categories": "object",
                        "bookmarkIds": "array"
                    }),
                },
                actions: vec!["categorize".to_string()],
            },
        )
    }

    fn outbox(&self) -> &MessageOutbox {
        &self.outbox
    }

    async fn execute(&self, task: &Task) -> Result<Value, OrchestratorError> {
        let ids = context_string_array(&task.context, "bookmarkIds");
        let bookmarks = self.db.get_bookmarks_by_ids(&ids)?;
        let mut categorized = 0usize;
        let mut counts: Map<String, Value> = Map::new();

        for bookmark in &bookmarks {
            let subject = bookmark.domain.as_deref().unwrap_or(&bookmark.url);
            let category = Self::categorize(subject);
            self.db.update_bookmark_category(&bookmark.id, category)?;
            categorized += 1;

            let count = counts.get(category).and_then(|v| v.as_u64()).unwrap_or(0);
            counts.insert(category.to_string(), json!(count + 1));
        }

        self.outbox.status(
            &task.id,
            &format!("categorized {} bookmarks", categorized),
        );

        Ok(json!({
            "categorized": categorized,
            "categories": counts,
            "bookmarkIds": ids
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bookmark;

    #[test]
    fn test_rules_first_match_wins() {
        assert_eq!(CategorizationAgent::categorize("github.com"), "development");
        assert_eq!(CategorizationAgent::categorize("www.youtube.com"), "video");
        assert_eq!(CategorizationAgent::categorize("en.wikipedia.org"), "reference");
        assert_eq!(CategorizationAgent::categorize("example.com"), DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn test_categorization_updates_rows_and_counts() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let mut a = Bookmark::new("u1", "https://github.com/rust-lang/rust", None);
        a.domain = Some("github.com".to_string());
        let b = Bookmark::new("u1", "https://example.com/misc", None);
        db.insert_bookmark(&a).unwrap();
        db.insert_bookmark(&b).unwrap();

        let agent = CategorizationAgent::new(db.clone());
        let mut context = Map::new();
        context.insert("bookmarkIds".to_string(), json!([a.id, b.id]));
        let task = Task::new("reprocess", vec!["categorization".to_string()], context);

        let output = agent.execute(&task).await.unwrap();
        assert_eq!(output["categorized"], json!(2));
        assert_eq!(output["categories"]["development"], json!(1));
        assert_eq!(output["categories"][DEFAULT_CATEGORY], json!(1));

        assert_eq!(
            db.get_bookmark(&a.id).unwrap().unwrap().category.as_deref(),
            Some("development")
        );
    }
}
