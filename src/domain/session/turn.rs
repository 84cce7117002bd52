//! Transcript entries.

use serde::{Deserialize, Serialize};

use crate::domain::dialogue::TutorPhase;
use crate::domain::foundation::Timestamp;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Student,
    Tutor,
}

/// One turn in the session transcript.
///
/// Turns are append-only; the phase is captured at append time so the
/// transcript can be replayed against the phase history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub content: String,
    pub phase_at_time: TutorPhase,
    pub timestamp: Timestamp,
}

impl ConversationTurn {
    pub fn student(content: impl Into<String>, phase: TutorPhase) -> Self {
        Self {
            speaker: Speaker::Student,
            content: content.into(),
            phase_at_time: phase,
            timestamp: Timestamp::now(),
        }
    }

    pub fn tutor(content: impl Into<String>, phase: TutorPhase) -> Self {
        Self {
            speaker: Speaker::Tutor,
            content: content.into(),
            phase_at_time: phase,
            timestamp: Timestamp::now(),
        }
    }
}
