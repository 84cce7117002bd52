//! Utterance assembly from the transcript stream.
//!
//! The recognizer emits interim and final segments; only finals are
//! committed text. This module drains one stream and folds the finals
//! into a single `StudentInput` the engine can act on.

use crate::ports::{StudentInput, TranscriptStream};

/// Drains the stream and assembles the committed segments.
///
/// Interim segments are discarded. The utterance confidence is the
/// minimum across final segments, so one poorly heard stretch marks the
/// whole utterance as uncertain. Returns `None` when the stream closed
/// without committing any text.
pub async fn collect_utterance(mut stream: TranscriptStream) -> Option<StudentInput> {
    let mut texts: Vec<String> = Vec::new();
    let mut words = Vec::new();
    let mut confidence = f64::MAX;

    while let Some(segment) = stream.next_segment().await {
        if !segment.is_final {
            continue;
        }
        confidence = confidence.min(segment.confidence);
        texts.push(segment.text);
        words.extend(segment.words);
    }

    if texts.is_empty() {
        return None;
    }

    let duration_secs = words
        .iter()
        .map(|timing| timing.end_secs)
        .fold(0.0_f64, f64::max);

    Some(StudentInput {
        text: texts.join(" "),
        confidence,
        words,
        duration_secs,
    })
}
