//! Workflow catalog - named, ordered agent sequences
//!
//! The catalog is immutable at runtime: adding a workflow is a code change,
//! which keeps workflow definitions auditable and versioned. Tasks snapshot
//! the resolved agent list at creation time.

use std::collections::BTreeMap;

use crate::agents::builtin::{
    CategorizationAgent, EmbeddingAgent, EnrichmentAgent, ImportAgent, ValidationAgent,
};

pub struct WorkflowCatalog {
    workflows: BTreeMap<String, Vec<String>>,
}

impl WorkflowCatalog {
    /// The standard bookmark pipeline workflows.
    pub fn standard() -> Self {
        Self::from_entries(&[
            ("quick_import", &[ImportAgent::AGENT_TYPE]),
            (
                "full_import",
                &[
                    ImportAgent::AGENT_TYPE,
                    ValidationAgent::AGENT_TYPE,
                    EnrichmentAgent::AGENT_TYPE,
                ],
            ),
            ("validation_only", &[ValidationAgent::AGENT_TYPE]),
            ("enrichment_only", &[EnrichmentAgent::AGENT_TYPE]),
            (
                "reprocess",
                &[ValidationAgent::AGENT_TYPE, EnrichmentAgent::AGENT_TYPE],
            ),
            (
                "full_pipeline",
                &[
                    ImportAgent::AGENT_TYPE,
                    ValidationAgent::AGENT_TYPE,
                    EnrichmentAgent::AGENT_TYPE,
                    CategorizationAgent::AGENT_TYPE,
                    EmbeddingAgent::AGENT_TYPE,
                ],
            ),
        ])
    }

    pub fn from_entries(entries: &[(&str, &[&str])]) -> Self {
        let workflows = entries
            .iter()
            .map(|(name, agents)| {
                (
                    name.to_string(),
                    agents.iter().map(|a| a.to_string()).collect(),
                )
            })
            .collect();
        Self { workflows }
    }

    /// Resolve a workflow name to its agent sequence.
    pub fn resolve(&self, name: &str) -> Option<&[String]> {
        self.workflows.get(name).map(|agents| agents.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.workflows.contains_key(name)
    }

    /// All workflow names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.workflows.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_entries() {
        let catalog = WorkflowCatalog::standard();
        assert_eq!(catalog.resolve("quick_import").unwrap(), &["import"]);
        assert_eq!(
            catalog.resolve("full_import").unwrap(),
            &["import", "validation", "enrichment"]
        );
        assert_eq!(catalog.resolve("validation_only").unwrap(), &["validation"]);
        assert_eq!(catalog.resolve("enrichment_only").unwrap(), &["enrichment"]);
        assert_eq!(
            catalog.resolve("reprocess").unwrap(),
            &["validation", "enrichment"]
        );
        assert_eq!(catalog.resolve("full_pipeline").unwrap().len(), 5);
        assert!(catalog.resolve("not_a_workflow").is_none());
    }

    #[test]
    fn test_resolving_twice_is_deterministic() {
        let catalog = WorkflowCatalog::standard();
        assert_eq!(
            catalog.resolve("full_import").unwrap(),
            catalog.resolve("full_import").unwrap()
        );
    }

    #[test]
    fn test_names_are_sorted() {
        let catalog = WorkflowCatalog::standard();
        let names = catalog.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
