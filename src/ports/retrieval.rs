//! Retrieval Port - Interface for grounding-material search.
//!
//! The tutor grounds hints, repairs and summaries in material retrieved
//! for the question at hand. This port abstracts the vector-search
//! service that supplies that material.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::foundation::{ConceptId, QuestionId};

/// Port for similarity search over teaching material.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Searches for material relevant to the query.
    ///
    /// Results are ordered by descending similarity.
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError>;
}

/// One retrieved piece of teaching material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Identifier in the source corpus.
    pub id: String,
    /// The material itself.
    pub content: String,
    /// Material kind (e.g. "solution_sketch", "rubric", "lecture_note").
    pub kind: String,
    /// Similarity to the query, higher is closer.
    pub similarity: f64,
    /// Source-specific annotations.
    pub metadata: HashMap<String, String>,
}

impl RetrievedDocument {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        kind: impl Into<String>,
        similarity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            kind: kind.into(),
            similarity,
            metadata: HashMap::new(),
        }
    }

    /// Adds a metadata annotation.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Search constraints for one retrieval call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    /// Restrict to material for one question.
    pub question_id: Option<QuestionId>,
    /// Restrict to material tagged with these knowledge nodes.
    pub knowledge_nodes: Vec<ConceptId>,
    /// Cap on the number of results.
    pub max_results: Option<usize>,
    /// Drop results below this similarity.
    pub min_similarity: Option<f64>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the search to one question's material.
    pub fn for_question(mut self, question_id: QuestionId) -> Self {
        self.question_id = Some(question_id);
        self
    }

    /// Restricts the search to the given knowledge nodes.
    pub fn with_knowledge_nodes(mut self, nodes: Vec<ConceptId>) -> Self {
        self.knowledge_nodes = nodes;
        self
    }

    /// Caps the number of results.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Sets the similarity floor.
    pub fn with_min_similarity(mut self, min: f64) -> Self {
        self.min_similarity = Some(min);
        self
    }
}

/// Retrieval service errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Service is unavailable.
    #[error("retrieval unavailable: {message}")]
    Unavailable { message: String },

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the service response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The query was rejected by the service.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Request timed out.
    #[error("retrieval timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl RetrievalError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RetrievalError::Unavailable { .. }
                | RetrievalError::Network(_)
                | RetrievalError::Timeout { .. }
        )
    }
}
