//! Question Bank Port - Interface for question lookup.
//!
//! Questions and their knowledge nodes are authored elsewhere; the
//! engine only needs to load one record per session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::{ConceptId, QuestionId};

/// Port for loading question records.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Loads one question with its knowledge nodes.
    async fn load_question(&self, id: &QuestionId) -> Result<QuestionRecord, QuestionBankError>;
}

/// A concept the question expects the student to address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    pub id: ConceptId,
    /// Human-readable name shown in prompts.
    pub label: String,
    /// Phrases whose mention counts as addressing this concept.
    pub keywords: Vec<String>,
}

impl KnowledgeNode {
    pub fn new(id: ConceptId, label: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            id,
            label: label.into(),
            keywords,
        }
    }
}

/// One question as the tutor sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    /// The question text read to the student.
    pub prompt: String,
    pub knowledge_nodes: Vec<KnowledgeNode>,
}

impl QuestionRecord {
    pub fn new(id: QuestionId, prompt: impl Into<String>, knowledge_nodes: Vec<KnowledgeNode>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            knowledge_nodes,
        }
    }

    /// Returns the concept set a complete answer must cover.
    pub fn required_concepts(&self) -> BTreeSet<ConceptId> {
        self.knowledge_nodes
            .iter()
            .map(|node| node.id.clone())
            .collect()
    }

    /// Returns the node for a concept, if the question has it.
    pub fn node_for(&self, concept: &ConceptId) -> Option<&KnowledgeNode> {
        self.knowledge_nodes.iter().find(|node| &node.id == concept)
    }
}

/// Question bank errors.
#[derive(Debug, thiserror::Error)]
pub enum QuestionBankError {
    /// No question with the given ID.
    #[error("question {id} not found")]
    NotFound { id: QuestionId },

    /// The backing store failed.
    #[error("question store failure: {message}")]
    StoreFailure { message: String },
}

impl QuestionBankError {
    /// Creates a not found error.
    pub fn not_found(id: QuestionId) -> Self {
        Self::NotFound { id }
    }

    /// Creates a store failure error.
    pub fn store_failure(message: impl Into<String>) -> Self {
        Self::StoreFailure {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> QuestionRecord {
        QuestionRecord::new(
            QuestionId::new(),
            "Explain why binary search runs in O(log n).",
            vec![
                KnowledgeNode::new(
                    ConceptId::new("halving").unwrap(),
                    "Halving the search space",
                    vec!["half".to_string(), "divide".to_string()],
                ),
                KnowledgeNode::new(
                    ConceptId::new("sorted-input").unwrap(),
                    "Sorted input assumption",
                    vec!["sorted".to_string(), "ordered".to_string()],
                ),
            ],
        )
    }

    #[test]
    fn required_concepts_come_from_the_nodes() {
        let record = record();
        let required = record.required_concepts();
        assert_eq!(required.len(), 2);
        assert!(required.contains(&ConceptId::new("halving").unwrap()));
        assert!(required.contains(&ConceptId::new("sorted-input").unwrap()));
    }

    #[test]
    fn node_lookup_finds_known_concepts() {
        let record = record();
        let node = record.node_for(&ConceptId::new("halving").unwrap()).unwrap();
        assert_eq!(node.label, "Halving the search space");
        assert!(record.node_for(&ConceptId::new("missing").unwrap()).is_none());
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = record();
        let json = serde_json::to_string(&record).unwrap();
        let restored: QuestionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }
}
