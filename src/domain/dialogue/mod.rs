//! Dialogue domain module.
//!
//! Owns the tutoring phase model: which phase the tutor is in, which
//! events move it, and the canned lines used when generation cannot be
//! trusted. All logic here is synchronous and free of IO.

mod event;
mod fsm;
mod hint;
mod phase;
pub mod templates;

pub use event::{TutorEvent, UserRequestKind};
pub use fsm::{
    PhaseController, TransitionOutcome, TransitionRecord, TransitionThresholds,
    TransitionTrigger,
};
pub use hint::{HintLadder, HintUsage};
pub use phase::TutorPhase;
