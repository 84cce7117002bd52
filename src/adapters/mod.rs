//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Generation services (OpenAI-compatible HTTP, mock)
//! - `analysis` - Utterance analyzers (keyword heuristics, mock)
//! - `questions` - Question banks (in-memory)
//! - `retrieval` - Grounding-material search (HTTP, mock)
//! - `speech` - Transcription sources (scripted)
//! - `storage` - Session stores (file, in-memory)

pub mod ai;
pub mod analysis;
pub mod questions;
pub mod retrieval;
pub mod speech;
pub mod storage;
