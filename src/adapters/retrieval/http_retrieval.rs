//! HTTP Retrieval - RetrievalService over a JSON search API.
//!
//! Posts queries to a vector-search service and maps the hits back to
//! retrieved documents. The adapter does a single attempt per call;
//! fallback policy (relaxed retries, degraded mode) lives with the
//! caller, which knows the conversational deadline it is working under.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpRetrievalConfig::new("https://search.internal")
//!     .with_timeout(Duration::from_secs(5));
//!
//! let retrieval = HttpRetrieval::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::ports::{RetrievalError, RetrievalService, RetrievedDocument, SearchFilters};

/// Configuration for the HTTP retrieval adapter.
#[derive(Debug, Clone)]
pub struct HttpRetrievalConfig {
    /// Base URL of the search service.
    pub endpoint: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpRetrievalConfig {
    /// Creates a configuration pointing at the given base URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON search service adapter.
pub struct HttpRetrieval {
    config: HttpRetrievalConfig,
    client: Client,
}

impl HttpRetrieval {
    /// Creates a retrieval adapter with the given configuration.
    pub fn new(config: HttpRetrievalConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the search endpoint URL.
    fn search_url(&self) -> String {
        format!("{}/search", self.config.endpoint)
    }

    /// Converts a query and filters to the wire format.
    fn to_wire_request(query: &str, filters: &SearchFilters) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            question_id: filters.question_id.map(|id| id.to_string()),
            knowledge_nodes: filters
                .knowledge_nodes
                .iter()
                .map(|node| node.as_str().to_string())
                .collect(),
            max_results: filters.max_results,
            min_similarity: filters.min_similarity,
        }
    }

    /// Maps non-success statuses onto retrieval errors.
    async fn handle_response_status(
        &self,
        response: Response,
    ) -> Result<Response, RetrievalError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            400 | 422 => Err(RetrievalError::InvalidQuery(error_body)),
            500..=599 => Err(RetrievalError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(RetrievalError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }
}

#[async_trait]
impl RetrievalService for HttpRetrieval {
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
        let request = Self::to_wire_request(query, filters);

        let response = self
            .client
            .post(self.search_url())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    RetrievalError::network(format!("Connection failed: {}", e))
                } else {
                    RetrievalError::network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;

        let wire: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::parse(format!("Failed to parse response: {}", e)))?;

        Ok(wire.results.into_iter().map(SearchHit::into_document).collect())
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    question_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    knowledge_nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_similarity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    content: String,
    kind: String,
    similarity: f64,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl SearchHit {
    fn into_document(self) -> RetrievedDocument {
        let mut doc = RetrievedDocument::new(self.id, self.content, self.kind, self.similarity);
        doc.metadata = self.metadata;
        doc
    }
}
