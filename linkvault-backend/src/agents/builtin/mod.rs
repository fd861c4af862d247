//! Built-in pipeline agents

mod categorization;
mod embedding;
mod enrichment;
mod import;
mod validation;

pub use categorization::CategorizationAgent;
pub use embedding::{EmbeddingAgent, EMBEDDING_DIM};
pub use enrichment::EnrichmentAgent;
pub use import::ImportAgent;
pub use validation::ValidationAgent;
