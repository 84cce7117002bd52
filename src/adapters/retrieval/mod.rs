//! Retrieval Adapters.
//!
//! Implementations of the RetrievalService port.
//!
//! ## Available Adapters
//!
//! - `MockRetrieval` - Configurable mock for testing
//! - `HttpRetrieval` - JSON vector-search service client

mod http_retrieval;
mod mock_retrieval;

pub use http_retrieval::{HttpRetrieval, HttpRetrievalConfig};
pub use mock_retrieval::{MockRetrieval, MockRetrievalError, MockSearchOutcome, RecordedSearch};
