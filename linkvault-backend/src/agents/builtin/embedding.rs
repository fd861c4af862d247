//! Embedding agent - deterministic feature-hashed vectors for bookmarks
//!
//! A cheap local stand-in for a model-backed embedder: tokens from the title
//! and URL are hashed into a fixed-width bag-of-words vector, L2-normalized.
//! Equal inputs always produce equal vectors.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::agents::{context_string_array, Agent, MessageOutbox};
use crate::db::Database;
use crate::error::OrchestratorError;
use crate::models::{AgentCapabilities, AgentCard, FieldType, InputSpec, OutputSpec, Task};

pub const EMBEDDING_DIM: usize = 64;

pub struct EmbeddingAgent {
    db: Arc<Database>,
    outbox: MessageOutbox,
}

impl EmbeddingAgent {
    pub const AGENT_TYPE: &'static str = "embedding";

    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            outbox: MessageOutbox::new(Self::AGENT_TYPE),
        }
    }

    fn embed(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIM];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 2)
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % EMBEDDING_DIM;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Agent for EmbeddingAgent {
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
                description: "Computes feature-hashed embedding vectors for bookmarks"
                    .to_string(),
                inputs,
                outputs: OutputSpec {
                    output_type: "embedding_result".to_string(),
                    schema: json!({
                        "embeddedCount": "number",
                        "dimensions": "number",
                        "bookmarkIds": "array"
                    }),
                },
                actions: vec!["embed".to_string()],
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
        let mut embedded_count = 0usize;

        for (index, bookmark) in bookmarks.iter().enumerate() {
            let text = match &bookmark.title {
                Some(title) => format!("{} {}", title, bookmark.url),
                None => bookmark.url.clone(),
            };
            let vector = Self::embed(&text);
            self.db.update_bookmark_embedding(&bookmark.id, &vector)?;
            embedded_count += 1;

            if (index + 1) % 10 == 0 {
                self.outbox.progress(
                    &task.id,
                    &format!("embedded {}/{} bookmarks", index + 1, total),
                    Some(((index + 1) * 100 / total) as u32),
                );
            }
        }

        Ok(json!({
            "embeddedCount": embedded_count,
            "dimensions": EMBEDDING_DIM,
            "bookmarkIds": ids
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bookmark;
    use serde_json::Map;

    #[test]
    fn test_embed_is_deterministic_and_normalized() {
        let a = EmbeddingAgent::embed("Rust async book https://example.com/rust");
        let b = EmbeddingAgent::embed("Rust async book https://example.com/rust");
        assert_eq!(a, b);
        assert_eq!(a.len(), EMBEDDING_DIM);

        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embed_empty_text_is_zero_vector() {
        let v = EmbeddingAgent::embed("");
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_embedding_stores_vectors() {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let bm = Bookmark::new("u1", "https://example.com/rust", Some("Rust".to_string()));
        db.insert_bookmark(&bm).unwrap();

        let agent = EmbeddingAgent::new(db.clone());
        let mut context = Map::new();
        context.insert("bookmarkIds".to_string(), json!([bm.id]));
        let task = Task::new("full_pipeline", vec!["embedding".to_string()], context);

        let output = agent.execute(&task).await.unwrap();
        assert_eq!(output["embeddedCount"], json!(1));
        assert_eq!(output["dimensions"], json!(EMBEDDING_DIM));

        let stored = db.get_bookmark(&bm.id).unwrap().unwrap();
        assert_eq!(stored.embedding.unwrap().len(), EMBEDDING_DIM);
    }
}
