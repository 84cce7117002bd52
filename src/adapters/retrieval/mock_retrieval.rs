//! Mock Retrieval - Scriptable RetrievalService for tests.
//!
//! Returns queued search outcomes in FIFO order, falling back to an
//! empty result set once the queue is empty. Each call is recorded with
//! the query, the filters, and the time the result was handed back, so
//! tests can assert that retrieval finished before dependent calls on
//! other mocked ports started.
//!
//! # Example
//!
//! ```ignore
//! let retrieval = MockRetrieval::new()
//!     .with_empty()
//!     .with_documents(vec![RetrievedDocument::new("d1", "...", "rubric", 0.9)]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::Timestamp;
use crate::ports::{RetrievalError, RetrievalService, RetrievedDocument, SearchFilters};

/// A scripted outcome for one search call.
#[derive(Debug, Clone)]
pub enum MockSearchOutcome {
    /// Return these documents.
    Found(Vec<RetrievedDocument>),
    /// Fail with this error.
    Error(MockRetrievalError),
}

/// Failure modes the mock can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockRetrievalError {
    /// Service reports itself down.
    Unavailable,
    /// Transport-level failure.
    Network,
    /// Request timed out.
    Timeout,
}

impl From<MockRetrievalError> for RetrievalError {
    fn from(err: MockRetrievalError) -> Self {
        match err {
            MockRetrievalError::Unavailable => {
                RetrievalError::unavailable("mock retrieval configured as unavailable")
            }
            MockRetrievalError::Network => RetrievalError::network("mock retrieval network failure"),
            MockRetrievalError::Timeout => RetrievalError::Timeout { timeout_secs: 1 },
        }
    }
}

/// One observed search call.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// Query text the caller passed in.
    pub query: String,
    /// Filters the caller passed in.
    pub filters: SearchFilters,
    /// When the result was handed back.
    pub finished_at: Timestamp,
}

/// Mock implementation of [`RetrievalService`].
#[derive(Clone)]
pub struct MockRetrieval {
    /// Queued outcomes, consumed front to back.
    outcomes: Arc<Mutex<VecDeque<MockSearchOutcome>>>,
    /// Artificial latency applied to every call.
    delay: Duration,
    /// Calls observed so far.
    calls: Arc<Mutex<Vec<RecordedSearch>>>,
}

impl MockRetrieval {
    /// Creates a mock with an empty outcome queue.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful search with the given documents.
    pub fn with_documents(self, documents: Vec<RetrievedDocument>) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(MockSearchOutcome::Found(documents));
        }
        self
    }

    /// Queues a successful search with no results.
    pub fn with_empty(self) -> Self {
        self.with_documents(Vec::new())
    }

    /// Queues an error.
    pub fn with_error(self, error: MockRetrievalError) -> Self {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(MockSearchOutcome::Error(error));
        }
        self
    }

    /// Sets the artificial latency for every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// Snapshot of all observed calls.
    pub fn get_calls(&self) -> Vec<RecordedSearch> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Clears the call log.
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, query: &str, filters: &SearchFilters) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedSearch {
                query: query.to_string(),
                filters: filters.clone(),
                finished_at: Timestamp::now(),
            });
        }
    }
}

impl Default for MockRetrieval {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RetrievalService for MockRetrieval {
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let outcome = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or(MockSearchOutcome::Found(Vec::new()));

        // Recorded after the delay so finished_at reflects completion.
        self.record(query, filters);

        match outcome {
            MockSearchOutcome::Found(documents) => Ok(documents),
            MockSearchOutcome::Error(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConceptId;
    use std::time::Instant;

    fn rubric_doc() -> RetrievedDocument {
        RetrievedDocument::new("doc-1", "State the invariant before the loop.", "rubric", 0.88)
    }

    #[tokio::test]
    async fn returns_configured_documents() {
        let retrieval = MockRetrieval::new().with_documents(vec![rubric_doc()]);

        let docs = retrieval
            .search("loop invariant", &SearchFilters::new())
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "doc-1");
    }

    #[tokio::test]
    async fn outcomes_come_back_in_order() {
        let retrieval = MockRetrieval::new()
            .with_empty()
            .with_documents(vec![rubric_doc()]);

        let filters = SearchFilters::new();
        assert!(retrieval.search("q", &filters).await.unwrap().is_empty());
        assert_eq!(retrieval.search("q", &filters).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_empty_after_queue_empties() {
        let retrieval = MockRetrieval::new();
        let docs = retrieval.search("q", &SearchFilters::new()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn queued_error_is_returned_and_classified() {
        let retrieval = MockRetrieval::new().with_error(MockRetrievalError::Timeout);

        let err = retrieval
            .search("q", &SearchFilters::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Timeout { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn records_queries_filters_and_completion_times() {
        let retrieval = MockRetrieval::new();
        let before = Timestamp::now();
        let filters = SearchFilters::new()
            .with_knowledge_nodes(vec![ConceptId::new("base-case").unwrap()])
            .with_min_similarity(0.75);

        retrieval.search("first", &filters).await.unwrap();
        retrieval.search("second", &SearchFilters::new()).await.unwrap();

        assert_eq!(retrieval.call_count(), 2);
        let calls = retrieval.get_calls();
        assert_eq!(calls[0].query, "first");
        assert_eq!(calls[0].filters.min_similarity, Some(0.75));
        assert_eq!(calls[1].query, "second");
        assert!(!calls[0].finished_at.is_before(&before));
        assert!(!calls[1].finished_at.is_before(&calls[0].finished_at));
    }

    #[tokio::test]
    async fn clear_calls_resets_the_log() {
        let retrieval = MockRetrieval::new();
        retrieval.search("q", &SearchFilters::new()).await.unwrap();
        retrieval.clear_calls();
        assert_eq!(retrieval.call_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_the_queue_and_log() {
        let retrieval = MockRetrieval::new().with_documents(vec![rubric_doc()]);
        let handle = retrieval.clone();

        let docs = retrieval.search("q", &SearchFilters::new()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(handle.call_count(), 1);
    }

    #[tokio::test]
    async fn delay_is_applied_before_completion() {
        let retrieval = MockRetrieval::new().with_delay(Duration::from_millis(50));

        let start = Instant::now();
        retrieval.search("q", &SearchFilters::new()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
