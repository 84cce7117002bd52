//! Scripted Transcriber - Replayable SpeechToText for tests and demos.
//!
//! Feeds a fixed segment script through the transcript channel from a
//! background task, with optional per-segment delays to mimic a live
//! recognizer. Every `open_stream` call replays the full script from
//! the top. Cancellation is honored between segments.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{SegmentSink, SpeechError, SpeechToText, TranscriptSegment, TranscriptStream};

#[derive(Debug, Clone)]
struct ScriptedSegment {
    delay: Duration,
    segment: TranscriptSegment,
}

/// Script-driven implementation of [`SpeechToText`].
#[derive(Clone)]
pub struct ScriptedTranscriber {
    script: Vec<ScriptedSegment>,
    capacity: usize,
    fail_to_open: bool,
}

impl ScriptedTranscriber {
    /// Creates a transcriber with an empty script.
    pub fn new() -> Self {
        Self {
            script: Vec::new(),
            capacity: 32,
            fail_to_open: false,
        }
    }

    /// Creates a transcriber whose streams never open.
    pub fn unavailable() -> Self {
        Self {
            fail_to_open: true,
            ..Self::new()
        }
    }

    /// Appends a segment delivered immediately.
    pub fn with_segment(self, segment: TranscriptSegment) -> Self {
        self.with_delayed_segment(Duration::ZERO, segment)
    }

    /// Appends a segment delivered after a delay.
    pub fn with_delayed_segment(mut self, delay: Duration, segment: TranscriptSegment) -> Self {
        self.script.push(ScriptedSegment { delay, segment });
        self
    }

    /// Sets the channel capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    async fn feed(script: Vec<ScriptedSegment>, sink: SegmentSink) {
        for entry in script {
            if !entry.delay.is_zero() {
                sleep(entry.delay).await;
            }
            if sink.is_cancelled() {
                break;
            }
            if sink.send(entry.segment).await.is_err() {
                break;
            }
        }
    }
}

impl Default for ScriptedTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechToText for ScriptedTranscriber {
    async fn open_stream(&self) -> Result<TranscriptStream, SpeechError> {
        if self.fail_to_open {
            return Err(SpeechError::unavailable("scripted transcriber set to fail"));
        }

        let (sink, stream) = TranscriptStream::channel(self.capacity);
        let script = self.script.clone();
        tokio::spawn(Self::feed(script, sink));

        Ok(stream)
    }
}
