//! Deterministic phase transition rules.
//!
//! The controller owns the current phase and the append-only transition
//! history for one session. Rules are evaluated top to bottom and the
//! first match wins; an event matching no rule leaves the phase unchanged
//! and is reported as rejected rather than raised as an error.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::event::TutorEvent;
use super::phase::TutorPhase;

/// Thresholds governing the silence and consolidation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionThresholds {
    /// Silence must exceed this many seconds before hinting starts.
    pub silence_timeout_secs: f64,
    /// Coverage at or above this fraction triggers consolidation.
    pub consolidation_coverage: f64,
}

impl Default for TransitionThresholds {
    fn default() -> Self {
        Self {
            silence_timeout_secs: 10.0,
            consolidation_coverage: 0.90,
        }
    }
}

/// Why a transition was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionTrigger {
    /// An event matched a rule in the table.
    Event { event: TutorEvent },
    /// The controller was forcibly reset outside the rule table.
    Forced { reason: String },
}

/// One applied transition in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: TutorPhase,
    pub to: TutorPhase,
    pub trigger: TransitionTrigger,
    pub timestamp: Timestamp,
}

/// Result of feeding one event into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// A rule matched and the phase moved (possibly to itself).
    Applied { from: TutorPhase, to: TutorPhase },
    /// No rule matched; the phase is unchanged.
    Rejected { phase: TutorPhase },
}

impl TransitionOutcome {
    /// Returns the phase after the event was processed.
    pub fn phase(&self) -> TutorPhase {
        match self {
            TransitionOutcome::Applied { to, .. } => *to,
            TransitionOutcome::Rejected { phase } => *phase,
        }
    }

    /// Returns true if a rule matched.
    pub fn was_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied { .. })
    }
}

/// First-match rule table over tutor phases.
///
/// The table, in evaluation order:
///
/// 1. Listening + logic gap            -> Probing
/// 2. Listening + logic error          -> Repair
/// 3. Listening + silence > threshold  -> Hinting
/// 4. any non-Idle + hint request      -> Hinting
/// 5. any non-Idle + coverage >= goal  -> Consolidating
/// 6. Idle + start request             -> Listening
///
/// The controller is serialized as part of the owning session so that a
/// restored session resumes with its phase and history intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseController {
    thresholds: TransitionThresholds,
    current: TutorPhase,
    history: Vec<TransitionRecord>,
}

impl PhaseController {
    /// Creates a controller in the Idle phase with an empty history.
    pub fn new(thresholds: TransitionThresholds) -> Self {
        Self {
            thresholds,
            current: TutorPhase::Idle,
            history: Vec::new(),
        }
    }

    /// Creates a controller with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(TransitionThresholds::default())
    }

    /// Returns the current phase.
    pub fn current_phase(&self) -> TutorPhase {
        self.current
    }

    /// Returns the ordered transition history.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    /// Returns the active thresholds.
    pub fn thresholds(&self) -> &TransitionThresholds {
        &self.thresholds
    }

    /// Returns the timestamp of the most recent applied transition, if any.
    pub fn last_transition_at(&self) -> Option<Timestamp> {
        self.history.last().map(|record| record.timestamp)
    }

    /// Feeds one event through the rule table.
    ///
    /// On a match the phase moves and a record is appended to the history.
    /// On no match the phase and history are untouched.
    pub fn process_event(&mut self, event: &TutorEvent) -> TransitionOutcome {
        let from = self.current;
        match self.next_phase(event) {
            Some(to) => {
                self.current = to;
                self.history.push(TransitionRecord {
                    from,
                    to,
                    trigger: TransitionTrigger::Event {
                        event: event.clone(),
                    },
                    timestamp: Timestamp::now(),
                });
                TransitionOutcome::Applied { from, to }
            }
            None => TransitionOutcome::Rejected { phase: from },
        }
    }

    /// Forces the controller back to Idle, recording the override.
    ///
    /// Used when a session is detected as stuck. Bypasses the rule table.
    pub fn force_idle(&mut self, reason: impl Into<String>) -> TransitionRecord {
        let record = TransitionRecord {
            from: self.current,
            to: TutorPhase::Idle,
            trigger: TransitionTrigger::Forced {
                reason: reason.into(),
            },
            timestamp: Timestamp::now(),
        };
        self.current = TutorPhase::Idle;
        self.history.push(record.clone());
        record
    }

    /// Returns the controller to Idle and clears the history.
    pub fn reset(&mut self) {
        self.current = TutorPhase::Idle;
        self.history.clear();
    }

    /// Applies the rule table to one event. First match wins.
    fn next_phase(&self, event: &TutorEvent) -> Option<TutorPhase> {
        let current = self.current;

        if current == TutorPhase::Listening && event.signals_logic_gap() {
            return Some(TutorPhase::Probing);
        }
        if current == TutorPhase::Listening && event.signals_logic_error() {
            return Some(TutorPhase::Repair);
        }
        if current == TutorPhase::Listening && self.is_long_silence(event) {
            return Some(TutorPhase::Hinting);
        }
        if current != TutorPhase::Idle && event.is_hint_request() {
            return Some(TutorPhase::Hinting);
        }
        if current != TutorPhase::Idle && self.meets_consolidation(event) {
            return Some(TutorPhase::Consolidating);
        }
        if current == TutorPhase::Idle && event.is_start_request() {
            return Some(TutorPhase::Listening);
        }

        None
    }

    /// Silence must strictly exceed the threshold.
    fn is_long_silence(&self, event: &TutorEvent) -> bool {
        event
            .silence_duration_secs()
            .is_some_and(|secs| secs > self.thresholds.silence_timeout_secs)
    }

    /// Coverage at the threshold is enough; the comparison is inclusive.
    fn meets_consolidation(&self, event: &TutorEvent) -> bool {
        event
            .coverage_value()
            .is_some_and(|coverage| coverage.meets(self.thresholds.consolidation_coverage))
    }
}

impl Default for PhaseController {
    fn default() -> Self {
        Self::with_defaults()
    }
}
