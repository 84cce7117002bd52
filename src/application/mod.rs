//! Application layer - Conversation orchestration over domain and ports.
//!
//! The domain decides, the adapters talk to the world; this layer wires
//! the two together for one tutoring conversation at a time:
//!
//! - `engine` routes each stimulus through the phase rules and produces
//!   the tutor's reply
//! - `context_gate` runs retrieval ahead of grounded generation
//! - `prompt` assembles generation prompts from session state
//! - `transcription` folds transcript segments into committed utterances
//! - `registry` keys concurrent live sessions and writes them through
//!   to the session store

pub mod context_gate;
pub mod engine;
pub mod prompt;
pub mod registry;
pub mod transcription;

pub use context_gate::{
    context_alignment, ContextGate, PreparedContext, RetrievalPolicy, RetrievalScope,
};
pub use engine::{
    DialogEngine, EngineError, EngineTuning, ResponseKind, SessionSnapshot, SessionSummary,
    TutorResponse,
};
pub use registry::{SessionHandle, SessionRegistry};
pub use transcription::collect_utterance;
