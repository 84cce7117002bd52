//! Hint escalation within a hinting episode.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConceptId, HintLevel, Timestamp};

use super::phase::TutorPhase;

/// One granted hint, kept in the session record for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintUsage {
    pub timestamp: Timestamp,
    pub level: HintLevel,
    pub concept: ConceptId,
}

/// Tracks the escalation level across one stay in the hinting phase.
///
/// Every entry into `Hinting` from a different phase starts a fresh
/// episode at the nudge level. Repeated requests inside the same episode
/// escalate one level at a time and saturate at the worked step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintLadder {
    current: Option<HintLevel>,
}

impl HintLadder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the level of the most recent hint in this episode.
    pub fn current(&self) -> Option<HintLevel> {
        self.current
    }

    /// Observes a phase transition and resets on a new hinting episode.
    ///
    /// A `Hinting` self-loop keeps the episode alive so that the ladder
    /// continues to escalate.
    pub fn on_phase_change(&mut self, from: TutorPhase, to: TutorPhase) {
        if to == TutorPhase::Hinting && from != TutorPhase::Hinting {
            self.current = None;
        }
    }

    /// Grants the next hint level and records the grant.
    pub fn request(&mut self, concept: ConceptId) -> HintUsage {
        let level = match self.current {
            None => HintLevel::Nudge,
            Some(level) => level.next(),
        };
        self.current = Some(level);
        HintUsage {
            timestamp: Timestamp::now(),
            level,
            concept,
        }
    }
}
