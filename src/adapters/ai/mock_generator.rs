//! Mock Generator - Scriptable GenerationService for tests.
//!
//! Returns queued replies in FIFO order, falling back to a canned line
//! once the queue is empty. Every call is recorded with the prompt and
//! a timestamp, so tests can assert how many generations happened and
//! in what order relative to other mocked ports.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockGenerator::new()
//!     .with_response("What does the base case return?")
//!     .with_error(MockGeneratorError::Network)
//!     .with_delay(Duration::from_millis(50));
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::Timestamp;
use crate::ports::{GenerationError, GenerationService, TextChunk, TextChunkStream, TutorPrompt};

/// Reply returned when the queue is exhausted.
const DEFAULT_REPLY: &str = "Walk me through that step once more.";

/// A scripted reply for one generation call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text.
    Success(String),
    /// Fail with this error.
    Error(MockGeneratorError),
}

/// Failure modes the mock can simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockGeneratorError {
    /// Service reports itself down.
    Unavailable,
    /// Transport-level failure.
    Network,
    /// Request timed out.
    Timeout,
    /// Rate limit hit.
    RateLimited,
}

impl From<MockGeneratorError> for GenerationError {
    fn from(err: MockGeneratorError) -> Self {
        match err {
            MockGeneratorError::Unavailable => {
                GenerationError::unavailable("mock generator configured as unavailable")
            }
            MockGeneratorError::Network => {
                GenerationError::network("mock generator network failure")
            }
            MockGeneratorError::Timeout => GenerationError::Timeout { timeout_secs: 1 },
            MockGeneratorError::RateLimited => GenerationError::rate_limited(1),
        }
    }
}

/// One observed generation call.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    /// Prompt the caller passed in.
    pub prompt: TutorPrompt,
    /// When the call arrived.
    pub called_at: Timestamp,
}

/// Mock implementation of [`GenerationService`].
#[derive(Clone)]
pub struct MockGenerator {
    /// Queued replies, consumed front to back.
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Artificial latency applied to every call.
    delay: Duration,
    /// Calls observed so far.
    calls: Arc<Mutex<Vec<RecordedGeneration>>>,
}

impl MockGenerator {
    /// Creates a mock with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful reply.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(MockReply::Success(text.into()));
        }
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockGeneratorError) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(MockReply::Error(error));
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
    pub fn get_calls(&self) -> Vec<RecordedGeneration> {
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

    /// Records the call, waits the configured delay, and pops a reply.
    async fn take_reply(&self, prompt: &TutorPrompt) -> MockReply {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedGeneration {
                prompt: prompt.clone(),
                called_at: Timestamp::now(),
            });
        }

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| MockReply::Success(DEFAULT_REPLY.to_string()))
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerator {
    async fn generate(&self, prompt: &TutorPrompt) -> Result<String, GenerationError> {
        match self.take_reply(prompt).await {
            MockReply::Success(text) => Ok(text),
            MockReply::Error(err) => Err(err.into()),
        }
    }

    async fn stream_generate(
        &self,
        prompt: &TutorPrompt,
    ) -> Result<TextChunkStream, GenerationError> {
        let text = match self.take_reply(prompt).await {
            MockReply::Success(text) => text,
            MockReply::Error(err) => return Err(err.into()),
        };

        // Keep the trailing space on each piece so concatenation
        // reproduces the reply exactly.
        let chunks: Vec<Result<TextChunk, GenerationError>> = text
            .split_inclusive(' ')
            .map(|piece| Ok(TextChunk::content(piece)))
            .collect();

        let stream = stream::iter(chunks).chain(stream::once(async { Ok(TextChunk::last()) }));
        Ok(Box::pin(stream))
    }
}
