//! Speech Port - Interface for streaming transcription.
//!
//! Recognition runs elsewhere; this port carries its output. Segments
//! flow over an explicit producer/consumer channel so the consumer can
//! stop mid-utterance, and the producer can observe that and stop
//! feeding audio.
//!
//! # Design
//!
//! - `SegmentSink` is the producer half handed to the recognizer
//! - `TranscriptStream` is the consumer half the application drains
//! - Cancellation travels against the segment flow via a watch channel
//! - The assembled `StudentInput` carries confidence and word timing so
//!   the engine can demand confirmation or derive pauses

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::domain::metrics::WordTiming;

/// Port for opening a transcription stream.
///
/// Implementations bind their own audio source; the contract is only
/// about how recognized text reaches the application.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Opens a stream of transcript segments for one utterance.
    async fn open_stream(&self) -> Result<TranscriptStream, SpeechError>;
}

/// One recognized piece of an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    /// Recognizer confidence in [0,1].
    pub confidence: f64,
    /// Word timings relative to the utterance start.
    pub words: Vec<WordTiming>,
    /// True once the recognizer has committed this text.
    pub is_final: bool,
}

impl TranscriptSegment {
    /// Creates a committed segment.
    pub fn final_segment(
        text: impl Into<String>,
        confidence: f64,
        words: Vec<WordTiming>,
    ) -> Self {
        Self {
            text: text.into(),
            confidence,
            words,
            is_final: true,
        }
    }

    /// Creates an interim segment that may still be revised.
    pub fn interim(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            words: Vec::new(),
            is_final: false,
        }
    }
}

/// A fully assembled student utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentInput {
    pub text: String,
    /// Overall recognizer confidence in [0,1].
    pub confidence: f64,
    /// Word timings relative to the utterance start.
    pub words: Vec<WordTiming>,
    /// Utterance length in seconds.
    pub duration_secs: f64,
}

impl StudentInput {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Returns true when the text should not be trusted as heard.
    pub fn is_low_confidence(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }
}

/// Producer half of a transcription channel.
///
/// Held by the recognizer; dropped when the utterance ends.
pub struct SegmentSink {
    segments: mpsc::Sender<TranscriptSegment>,
    cancelled: watch::Receiver<bool>,
}

impl SegmentSink {
    /// Sends one segment to the consumer.
    ///
    /// # Errors
    ///
    /// - `ChannelClosed` if the consumer is gone
    pub async fn send(&self, segment: TranscriptSegment) -> Result<(), SpeechError> {
        self.segments
            .send(segment)
            .await
            .map_err(|_| SpeechError::ChannelClosed)
    }

    /// Returns true once the consumer has cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}

/// Consumer half of a transcription channel.
pub struct TranscriptStream {
    segments: mpsc::Receiver<TranscriptSegment>,
    cancel: watch::Sender<bool>,
}

impl TranscriptStream {
    /// Creates a linked producer/consumer pair.
    pub fn channel(capacity: usize) -> (SegmentSink, TranscriptStream) {
        let (segment_tx, segment_rx) = mpsc::channel(capacity);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (
            SegmentSink {
                segments: segment_tx,
                cancelled: cancel_rx,
            },
            TranscriptStream {
                segments: segment_rx,
                cancel: cancel_tx,
            },
        )
    }

    /// Receives the next segment; `None` once the producer is done.
    pub async fn next_segment(&mut self) -> Option<TranscriptSegment> {
        self.segments.recv().await
    }

    /// Tells the producer to stop. Segments already in flight may still
    /// be received.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

/// Transcription transport errors.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The other half of the channel is gone.
    #[error("transcript channel closed")]
    ChannelClosed,

    /// The consumer cancelled the utterance.
    #[error("transcription cancelled")]
    Cancelled,

    /// Recognizer is unavailable.
    #[error("speech service unavailable: {message}")]
    Unavailable { message: String },
}

impl SpeechError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
