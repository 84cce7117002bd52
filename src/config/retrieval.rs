//! Retrieval service configuration

use std::time::Duration;

use serde::Deserialize;

use crate::application::RetrievalPolicy;

use super::error::ValidationError;

/// Settings for the vector search service behind the retrieval port
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the retrieval API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Similarity floor for the strict search pass
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Result cap for the strict search pass
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Similarity floor for the relaxed fallback pass
    #[serde(default = "default_relaxed_min_similarity")]
    pub relaxed_min_similarity: f64,

    /// Result cap for the relaxed fallback pass
    #[serde(default = "default_relaxed_max_results")]
    pub relaxed_max_results: usize,

    /// Per-search deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Maps this section onto the context gate's search policy
    pub fn policy(&self) -> RetrievalPolicy {
        RetrievalPolicy {
            min_similarity: self.min_similarity,
            max_results: self.max_results,
            relaxed_min_similarity: self.relaxed_min_similarity,
            relaxed_max_results: self.relaxed_max_results,
            timeout: self.timeout(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::MissingRequired("retrieval.endpoint"));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidEndpoint("retrieval.endpoint"));
        }

        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ValidationError::ThresholdOutOfRange("retrieval.min_similarity"));
        }

        if !(0.0..=1.0).contains(&self.relaxed_min_similarity) {
            return Err(ValidationError::ThresholdOutOfRange(
                "retrieval.relaxed_min_similarity",
            ));
        }

        if self.relaxed_min_similarity > self.min_similarity {
            return Err(ValidationError::RelaxedFloorAboveStrict);
        }

        if self.max_results == 0 {
            return Err(ValidationError::InvalidResultLimit("retrieval.max_results"));
        }

        if self.relaxed_max_results < self.max_results {
            return Err(ValidationError::RelaxedLimitBelowStrict);
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("retrieval.timeout_secs"));
        }

        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            min_similarity: default_min_similarity(),
            max_results: default_max_results(),
            relaxed_min_similarity: default_relaxed_min_similarity(),
            relaxed_max_results: default_relaxed_max_results(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:6333".to_string()
}

fn default_min_similarity() -> f64 {
    0.75
}

fn default_max_results() -> usize {
    5
}

fn default_relaxed_min_similarity() -> f64 {
    0.50
}

fn default_relaxed_max_results() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    5
}
