//! Speech Adapters.
//!
//! Implementations of the SpeechToText port.
//!
//! ## Available Adapters
//!
//! - `ScriptedTranscriber` - Replays a fixed segment script

mod scripted_transcriber;

pub use scripted_transcriber::ScriptedTranscriber;
