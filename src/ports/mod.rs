//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Conversation Ports
//!
//! - `SpeechToText` - Streaming transcription with cancellation
//! - `UtteranceAnalyzer` - Gap/error/concept classification per utterance
//! - `GenerationService` - Tutor response generation (one-shot and streaming)
//!
//! ## Material Ports
//!
//! - `RetrievalService` - Similarity search over teaching material
//! - `QuestionBank` - Question records and knowledge nodes
//!
//! ## Persistence Ports
//!
//! - `SessionStore` - Save/load of session records

mod analysis;
mod generation;
mod question_bank;
mod retrieval;
mod session_store;
mod speech;

pub use analysis::{AnalysisError, UtteranceAnalysis, UtteranceAnalyzer};
pub use generation::{
    GenerationError, GenerationService, PromptMessage, PromptRole, TextChunk, TextChunkStream,
    TutorPrompt,
};
pub use question_bank::{KnowledgeNode, QuestionBank, QuestionBankError, QuestionRecord};
pub use retrieval::{RetrievalError, RetrievalService, RetrievedDocument, SearchFilters};
pub use session_store::{SessionStore, SessionStoreError};
pub use speech::{
    SegmentSink, SpeechError, SpeechToText, StudentInput, TranscriptSegment, TranscriptStream,
};
