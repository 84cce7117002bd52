//! Session domain module.
//!
//! Holds the tutoring session aggregate and its transcript entries. The
//! session is the unit of persistence and the single writer surface for
//! all per-conversation state.

mod aggregate;
mod turn;

pub use aggregate::TutoringSession;
pub use turn::{ConversationTurn, Speaker};
