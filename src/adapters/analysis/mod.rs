//! Analysis Adapters.
//!
//! Implementations of the UtteranceAnalyzer port.
//!
//! ## Available Adapters
//!
//! - `KeywordAnalyzer` - Marker-phrase and keyword heuristics
//! - `MockAnalyzer` - Configurable mock for testing

mod keyword_analyzer;
mod mock_analyzer;

pub use keyword_analyzer::{KeywordAnalyzer, ERROR_MARKERS, GAP_MARKERS};
pub use mock_analyzer::{MockAnalyzer, MockJudgement};
