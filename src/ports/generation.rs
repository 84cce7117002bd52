//! Generation Port - Interface for the tutor's language model.
//!
//! Abstracts the completion service that turns an assembled prompt into
//! tutor wording, so the engine never couples to a specific provider.
//!
//! # Design
//!
//! - Supports both one-shot and streaming completions
//! - The prompt type is assembled by the application layer; sampling
//!   parameters (model, tokens, temperature) belong to the adapter
//! - Error classification distinguishes retryable transport failures
//!   from permanent ones
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct CannedGenerator;
//!
//! #[async_trait]
//! impl GenerationService for CannedGenerator {
//!     async fn generate(&self, prompt: &TutorPrompt) -> Result<String, GenerationError> {
//!         Ok("What does the base case look like?".to_string())
//!     }
//!     // ... stream_generate
//! }
//! ```

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Boxed chunk stream returned by streaming generation.
pub type TextChunkStream = Pin<Box<dyn Stream<Item = Result<TextChunk, GenerationError>> + Send>>;

/// Port for tutor response generation.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generates a complete response in one call.
    async fn generate(&self, prompt: &TutorPrompt) -> Result<String, GenerationError>;

    /// Generates a response as a stream of text chunks.
    ///
    /// The final chunk has `last` set; consumers may stop reading there.
    async fn stream_generate(&self, prompt: &TutorPrompt) -> Result<TextChunkStream, GenerationError>;
}

/// An assembled prompt for one tutor response.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorPrompt {
    /// Instructions describing the tutor's current job.
    pub system: String,
    /// Conversation excerpt, oldest first.
    pub messages: Vec<PromptMessage>,
}

impl TutorPrompt {
    /// Creates a prompt with the given system instructions.
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: Vec::new(),
        }
    }

    /// Appends a message to the conversation excerpt.
    pub fn with_message(mut self, role: PromptRole, content: impl Into<String>) -> Self {
        self.messages.push(PromptMessage::new(role, content));
        self
    }
}

/// One message in the prompt's conversation excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a student message.
    pub fn student(content: impl Into<String>) -> Self {
        Self::new(PromptRole::Student, content)
    }

    /// Creates a tutor message.
    pub fn tutor(content: impl Into<String>) -> Self {
        Self::new(PromptRole::Tutor, content)
    }
}

/// Who a prompt message is attributed to.
///
/// Adapters map these onto their wire roles (student -> user,
/// tutor -> assistant for OpenAI-style APIs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    Student,
    Tutor,
}

/// Streaming text chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// New text in this chunk.
    pub delta: String,
    /// True on the final chunk.
    pub last: bool,
}

impl TextChunk {
    /// Creates a content chunk.
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            last: false,
        }
    }

    /// Creates the terminating chunk.
    pub fn last() -> Self {
        Self {
            delta: String::new(),
            last: true,
        }
    }
}

/// Generation service errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("generation unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl GenerationError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

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
            GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
                | GenerationError::Timeout { .. }
        )
    }
}
