//! SessionStatus enum for tracking lifecycle of tutoring sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a tutoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Ended,
}

impl SessionStatus {
    /// Returns true if the session can be modified.
    pub fn is_mutable(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

impl StateMachine for SessionStatus {
    /// Valid transitions:
    /// - Active -> Ended
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!((self, target), (Active, Ended))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::Active => vec![SessionStatus::Ended],
            SessionStatus::Ended => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "Active",
            SessionStatus::Ended => "Ended",
        };
        write!(f, "{}", s)
    }
}
