//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the Viva Coach domain.

mod coverage;
mod errors;
mod hint_level;
mod ids;
mod session_status;
mod state_machine;
mod timestamp;

pub use coverage::Coverage;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use hint_level::HintLevel;
pub use ids::{ConceptId, QuestionId, SessionId, StudentId};
pub use session_status::SessionStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
