//! Enrichment agent - derives domain, title, and description for bookmarks

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

use crate::agents::{context_string_array, Agent, MessageOutbox};
use crate::db::Database;
use crate::error::OrchestratorError;
use crate::models::{AgentCapabilities, AgentCard, FieldType, InputSpec, OutputSpec, Task};

pub struct EnrichmentAgent {
    db: Arc<Database>,
    outbox: MessageOutbox,
}

impl EnrichmentAgent {
    pub const AGENT_TYPE: &'static str = "enrichment";

    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            outbox: MessageOutbox::new(Self::AGENT_TYPE),
        }
    }

    /// Derive a readable title from the URL's last path segment, e.g.
    /// `/posts/rust-async-book` becomes "rust async book".
    fn title_from_url(url: &Url) -> Option<String> {
        let segment = url
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()?
            .to_string();
        let stem = segment.split('.').next().unwrap_or(&segment);
        let title = stem.replace(['-', '_'], " ").trim().to_string();
        if title.is_empty() {
            None
        } else {
            Some(title)
        }
    }
}

#[async_trait]
impl Agent for EnrichmentAgent {
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
                description: "Fills in domain, missing titles, and descriptions".to_string(),
                inputs,
                outputs: OutputSpec {
                    output_type: "enrichment_result".to_string(),
                    schema: json!({
                        "enrichedCount": "number",
                        "bookmarkIds": "array"
                    }),
                },
                actions: vec!["enrich_metadata".to_string()],
            },
        )
    }

    fn outbox(&self) -> &MessageOutbox {
        &self.outbox
    }

    async fn execute(&self, task: &Task) -> Result<Value, OrchestratorError> {
        let ids = context_string_array(&task.context, "bookmarkIds");
        let bookmarks = self.db.get_bookmarks_by_ids(&ids)?;
        let total = bookmarks.len();
        let mut enriched_count = 0usize;

        for (index, bookmark) in bookmarks.iter().enumerate() {
            let Ok(parsed) = Url::parse(&bookmark.url) else {
                continue;
            };
            let Some(domain) = parsed.host_str() else {
                continue;
            };

            let fallback_title = if bookmark.title.is_none() {
                Self::title_from_url(&parsed)
            } else {
                None
            };
            let description = format!("Saved from {}", domain);

            self.db.update_bookmark_enrichment(
                &bookmark.id,
                fallback_title.as_deref(),
                domain,
                &description,
            )?;
            enriched_count += 1;

            if (index + 1) % 10 == 0 {
                self.outbox.progress(
                    &task.id,
                    &format!("enriched {}/{} bookmarks", index + 1, total),
                    Some(((index + 1) * 100 / total) as u32),
                );
            }
        }

        Ok(json!({
            "enrichedCount": enriched_count,
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
        Task::new("enrichment_only", vec!["enrichment".to_string()], context)
    }

    #[test]
    fn test_title_from_url() {
        let url = Url::parse("https://example.com/posts/rust-async_book.html").unwrap();
        assert_eq!(
            EnrichmentAgent::title_from_url(&url).as_deref(),
            Some("rust async book")
        );

        let bare = Url::parse("https://example.com/").unwrap();
        assert_eq!(EnrichmentAgent::title_from_url(&bare), None);
    }

    #[tokio::test]
    async fn test_enrichment_fills_domain_and_missing_title() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let untitled = Bookmark::new("u1", "https://example.com/posts/hello-world", None);
        let titled = Bookmark::new("u1", "https://example.com/x", Some("Kept".to_string()));
        db.insert_bookmark(&untitled).unwrap();
        db.insert_bookmark(&titled).unwrap();

        let agent = EnrichmentAgent::new(db.clone());
        let task = task_with_ids(&[untitled.id.clone(), titled.id.clone()]);
        let output = agent.execute(&task).await.unwrap();
        assert_eq!(output["enrichedCount"], json!(2));

        let loaded = db.get_bookmark(&untitled.id).unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("hello world"));
        assert_eq!(loaded.domain.as_deref(), Some("example.com"));
        assert_eq!(loaded.description.as_deref(), Some("Saved from example.com"));

        // existing titles are never overwritten
        let kept = db.get_bookmark(&titled.id).unwrap().unwrap();
        assert_eq!(kept.title.as_deref(), Some("Kept"));
    }
}
