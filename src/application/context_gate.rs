//! Context Gate - Retrieval with graceful degradation.
//!
//! Every generation that must be grounded goes through the gate first.
//! The gate runs the similarity search under a deadline, relaxes the
//! similarity floor once when the strict pass finds nothing, and turns
//! failures into an explicit degraded context instead of propagating
//! them into the conversation.
//!
//! The ordering contract is carried in the types: prompt builders take
//! a `&PreparedContext`, and the only way to obtain one for grounded
//! phases is to let the gate finish. `retrieved_at` records when it did.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::foundation::{ConceptId, QuestionId, Timestamp};
use crate::ports::{RetrievalError, RetrievalService, RetrievedDocument, SearchFilters};

/// Words shorter than this carry no topical signal and are ignored
/// when measuring alignment.
const MIN_CONTENT_WORD_LEN: usize = 4;

/// Thresholds and limits for the two-pass search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalPolicy {
    /// Similarity floor for the strict pass.
    pub min_similarity: f64,
    /// Result cap for the strict pass.
    pub max_results: usize,
    /// Similarity floor for the relaxed pass.
    pub relaxed_min_similarity: f64,
    /// Result cap for the relaxed pass.
    pub relaxed_max_results: usize,
    /// Deadline per search call.
    pub timeout: Duration,
}

impl Default for RetrievalPolicy {
    fn default() -> Self {
        Self {
            min_similarity: 0.75,
            max_results: 5,
            relaxed_min_similarity: 0.50,
            relaxed_max_results: 10,
            timeout: Duration::from_secs(5),
        }
    }
}

/// What the search is scoped to: one question, optionally narrowed to
/// the knowledge nodes currently under discussion.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalScope {
    pub question_id: QuestionId,
    pub knowledge_nodes: Vec<ConceptId>,
}

impl RetrievalScope {
    /// Creates a scope covering all material for the question.
    pub fn new(question_id: QuestionId) -> Self {
        Self {
            question_id,
            knowledge_nodes: Vec::new(),
        }
    }

    /// Narrows the scope to the given knowledge nodes.
    pub fn with_knowledge_nodes(mut self, nodes: Vec<ConceptId>) -> Self {
        self.knowledge_nodes = nodes;
        self
    }
}

/// The gate's conclusion: material to ground on, or an explicit
/// admission that there is none.
///
/// `retrieved_at` is stamped when the gate concluded, so callers can
/// verify retrieval finished before generation started.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedContext {
    /// Material to ground the reply in, ordered by descending similarity.
    pub documents: Vec<RetrievedDocument>,
    /// True when retrieval failed or found nothing and the reply must
    /// say so rather than improvise.
    pub degraded: bool,
    /// When the gate concluded.
    pub retrieved_at: Timestamp,
}

impl PreparedContext {
    /// Context for phases that do not need grounding material.
    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            degraded: false,
            retrieved_at: Timestamp::now(),
        }
    }

    fn grounded(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents,
            degraded: false,
            retrieved_at: Timestamp::now(),
        }
    }

    fn degraded() -> Self {
        Self {
            documents: Vec::new(),
            degraded: true,
            retrieved_at: Timestamp::now(),
        }
    }

    /// Returns true if no material was retrieved.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Two-pass retrieval front for the dialog engine.
#[derive(Clone)]
pub struct ContextGate {
    retrieval: Arc<dyn RetrievalService>,
    policy: RetrievalPolicy,
}

impl ContextGate {
    pub fn new(retrieval: Arc<dyn RetrievalService>, policy: RetrievalPolicy) -> Self {
        Self { retrieval, policy }
    }

    /// Runs the search and prepares the context for generation.
    ///
    /// Strict pass first; if it returns nothing, one relaxed pass with
    /// the lower floor and the wider cap. Errors and deadline misses do
    /// not propagate: the tutor keeps talking, degraded.
    pub async fn retrieve_then_prepare(
        &self,
        query: &str,
        scope: &RetrievalScope,
    ) -> PreparedContext {
        let strict = self.filters(scope, self.policy.min_similarity, self.policy.max_results);
        let documents = match self.search_with_deadline(query, &strict).await {
            Ok(documents) => documents,
            Err(error) => {
                warn!(error = %error, "Retrieval failed, continuing without material");
                return PreparedContext::degraded();
            }
        };
        if !documents.is_empty() {
            return PreparedContext::grounded(documents);
        }

        debug!(
            relaxed_min_similarity = self.policy.relaxed_min_similarity,
            "Strict retrieval found nothing, relaxing the similarity floor"
        );
        let relaxed = self.filters(
            scope,
            self.policy.relaxed_min_similarity,
            self.policy.relaxed_max_results,
        );
        match self.search_with_deadline(query, &relaxed).await {
            Ok(documents) if !documents.is_empty() => PreparedContext::grounded(documents),
            Ok(_) => {
                warn!("No material found even at the relaxed floor, continuing degraded");
                PreparedContext::degraded()
            }
            Err(error) => {
                warn!(error = %error, "Relaxed retrieval failed, continuing without material");
                PreparedContext::degraded()
            }
        }
    }

    fn filters(&self, scope: &RetrievalScope, min_similarity: f64, max_results: usize) -> SearchFilters {
        SearchFilters::new()
            .for_question(scope.question_id)
            .with_knowledge_nodes(scope.knowledge_nodes.clone())
            .with_max_results(max_results)
            .with_min_similarity(min_similarity)
    }

    async fn search_with_deadline(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let timeout_secs = self.policy.timeout.as_secs();
        match tokio::time::timeout(self.policy.timeout, self.retrieval.search(query, filters)).await
        {
            Ok(result) => result,
            Err(_) => Err(RetrievalError::Timeout { timeout_secs }),
        }
    }
}

/// Measures how much of a reply is drawn from the retrieved material.
///
/// The score is the fraction of distinct content words in the reply
/// that also appear in the documents. A reply about an empty context
/// scores 1.0: with nothing to contradict, nothing is misaligned.
pub fn context_alignment(reply: &str, context: &PreparedContext) -> f64 {
    let reply_words = content_words(reply);
    if reply_words.is_empty() || context.documents.is_empty() {
        return 1.0;
    }

    let material_words: HashSet<String> = context
        .documents
        .iter()
        .flat_map(|doc| content_words(&doc.content))
        .collect();
    if material_words.is_empty() {
        return 1.0;
    }

    let overlap = reply_words
        .iter()
        .filter(|word| material_words.contains(*word))
        .count();
    overlap as f64 / reply_words.len() as f64
}

fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= MIN_CONTENT_WORD_LEN)
        .map(str::to_string)
        .collect()
}
