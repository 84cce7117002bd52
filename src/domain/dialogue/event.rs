//! Events that drive tutor phase transitions.
//!
//! The event vocabulary is closed: collaborators map their observations
//! into one of these variants, and the rule table matches on them
//! exhaustively. Unknown stimulus kinds cannot exist at the type level.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Coverage;

/// What the student explicitly asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRequestKind {
    /// Begin the session.
    Start,
    /// Ask for a hint.
    Hint,
}

/// A single stimulus fed into the phase rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TutorEvent {
    /// The student has been quiet for the given number of seconds.
    SilenceTimeout { duration_secs: f64 },

    /// A reasoning step was skipped without analysis detail.
    LogicGap,

    /// A reasoning step was wrong without analysis detail.
    LogicError,

    /// Concept coverage alone crossed a reporting threshold.
    CoverageThreshold { value: Coverage },

    /// The student pressed a control (start, hint).
    UserRequest { kind: UserRequestKind },

    /// Full classification of the latest utterance.
    AnalysisComplete {
        logic_gap: bool,
        logic_error: bool,
        coverage: Coverage,
    },
}

impl TutorEvent {
    /// Creates a silence timeout event.
    pub fn silence_timeout(duration_secs: f64) -> Self {
        TutorEvent::SilenceTimeout { duration_secs }
    }

    /// Creates a coverage threshold event.
    pub fn coverage_threshold(value: Coverage) -> Self {
        TutorEvent::CoverageThreshold { value }
    }

    /// Creates a user request event.
    pub fn user_request(kind: UserRequestKind) -> Self {
        TutorEvent::UserRequest { kind }
    }

    /// Creates a session start request.
    pub fn start_request() -> Self {
        TutorEvent::UserRequest {
            kind: UserRequestKind::Start,
        }
    }

    /// Creates a hint request.
    pub fn hint_request() -> Self {
        TutorEvent::UserRequest {
            kind: UserRequestKind::Hint,
        }
    }

    /// Creates an analysis completion event.
    pub fn analysis_complete(logic_gap: bool, logic_error: bool, coverage: Coverage) -> Self {
        TutorEvent::AnalysisComplete {
            logic_gap,
            logic_error,
            coverage,
        }
    }

    /// Returns true if the event reports a skipped reasoning step.
    pub fn signals_logic_gap(&self) -> bool {
        match self {
            TutorEvent::LogicGap => true,
            TutorEvent::AnalysisComplete { logic_gap, .. } => *logic_gap,
            _ => false,
        }
    }

    /// Returns true if the event reports an incorrect reasoning step.
    pub fn signals_logic_error(&self) -> bool {
        match self {
            TutorEvent::LogicError => true,
            TutorEvent::AnalysisComplete { logic_error, .. } => *logic_error,
            _ => false,
        }
    }

    /// Returns the silence duration carried by the event, if any.
    pub fn silence_duration_secs(&self) -> Option<f64> {
        match self {
            TutorEvent::SilenceTimeout { duration_secs } => Some(*duration_secs),
            _ => None,
        }
    }

    /// Returns the coverage reading carried by the event, if any.
    pub fn coverage_value(&self) -> Option<Coverage> {
        match self {
            TutorEvent::CoverageThreshold { value } => Some(*value),
            TutorEvent::AnalysisComplete { coverage, .. } => Some(*coverage),
            _ => None,
        }
    }

    /// Returns true for an explicit hint request.
    pub fn is_hint_request(&self) -> bool {
        matches!(
            self,
            TutorEvent::UserRequest {
                kind: UserRequestKind::Hint
            }
        )
    }

    /// Returns true for an explicit start request.
    pub fn is_start_request(&self) -> bool {
        matches!(
            self,
            TutorEvent::UserRequest {
                kind: UserRequestKind::Start
            }
        )
    }

    /// Returns a stable label for logging.
    pub fn kind_label(&self) -> &'static str {
        match self {
            TutorEvent::SilenceTimeout { .. } => "silence_timeout",
            TutorEvent::LogicGap => "logic_gap",
            TutorEvent::LogicError => "logic_error",
            TutorEvent::CoverageThreshold { .. } => "coverage_threshold",
            TutorEvent::UserRequest {
                kind: UserRequestKind::Start,
            } => "user_request_start",
            TutorEvent::UserRequest {
                kind: UserRequestKind::Hint,
            } => "user_request_hint",
            TutorEvent::AnalysisComplete { .. } => "analysis_complete",
        }
    }
}

impl fmt::Display for TutorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_label())
    }
}
