//! Hint level value object (1-3 escalation scale).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Hint escalation level: 1 (gentle nudge) to 3 (worked step).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum HintLevel {
    #[default]
    Nudge = 1,
    Strategy = 2,
    WorkedStep = 3,
}

impl HintLevel {
    /// Creates a HintLevel from an integer, returning error if out of range.
    pub fn try_from_u8(value: u8) -> Result<Self, ValidationError> {
        match value {
            1 => Ok(HintLevel::Nudge),
            2 => Ok(HintLevel::Strategy),
            3 => Ok(HintLevel::WorkedStep),
            _ => Err(ValidationError::out_of_range(
                "hint_level",
                1.0,
                3.0,
                value as f64,
            )),
        }
    }

    /// Returns the numeric level.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Returns the display label.
    pub fn label(&self) -> &'static str {
        match self {
            HintLevel::Nudge => "Nudge",
            HintLevel::Strategy => "Strategy",
            HintLevel::WorkedStep => "Worked Step",
        }
    }

    /// Returns the dependency weight used in metrics calculations.
    pub fn weight(&self) -> f64 {
        match self {
            HintLevel::Nudge => 0.1,
            HintLevel::Strategy => 0.2,
            HintLevel::WorkedStep => 0.3,
        }
    }

    /// Returns the next escalation level, saturating at the maximum.
    pub fn next(&self) -> Self {
        match self {
            HintLevel::Nudge => HintLevel::Strategy,
            HintLevel::Strategy => HintLevel::WorkedStep,
            HintLevel::WorkedStep => HintLevel::WorkedStep,
        }
    }

    /// Returns true if this is the most explicit hint level.
    pub fn is_max(&self) -> bool {
        matches!(self, HintLevel::WorkedStep)
    }
}

impl From<HintLevel> for u8 {
    fn from(level: HintLevel) -> Self {
        level.value()
    }
}

impl TryFrom<u8> for HintLevel {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        HintLevel::try_from_u8(value)
    }
}

impl fmt::Display for HintLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.value())
    }
}
