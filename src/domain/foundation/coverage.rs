//! Coverage value object (0.0-1.0 scale).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A concept-coverage ratio between 0.0 and 1.0 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coverage(f64);

impl Coverage {
    /// No required concepts covered.
    pub const NONE: Self = Self(0.0);

    /// All required concepts covered.
    pub const FULL: Self = Self(1.0);

    /// Creates a new Coverage, clamping to valid range.
    ///
    /// NaN clamps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Creates a Coverage, returning error if out of range.
    pub fn try_new(value: f64) -> Result<Self, ValidationError> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::out_of_range("coverage", 0.0, 1.0, value));
        }
        Ok(Self(value))
    }

    /// Creates a Coverage from covered/required counts.
    ///
    /// An empty required set is trivially covered and yields `FULL`.
    pub fn from_ratio(covered: usize, required: usize) -> Self {
        if required == 0 {
            return Self::FULL;
        }
        Self::new(covered as f64 / required as f64)
    }

    /// Returns the value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns the value on a 0-100 scale.
    pub fn as_percent(&self) -> f64 {
        self.0 * 100.0
    }

    /// Returns true if this coverage meets or exceeds the given threshold.
    pub fn meets(&self, threshold: f64) -> bool {
        self.0 >= threshold
    }
}

impl Default for Coverage {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.as_percent())
    }
}
