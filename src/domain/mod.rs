//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `dialogue` - Tutor phases, transition rules, hint escalation, canned lines
//! - `session` - Tutoring session aggregate and transcript
//! - `metrics` - Pure speaking/focus/coverage metric computation

pub mod dialogue;
pub mod foundation;
pub mod metrics;
pub mod session;
