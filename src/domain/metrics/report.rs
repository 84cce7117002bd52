//! Final metrics snapshot for a session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Coverage;

/// A cluster of pauses long enough to count as lost focus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistractionPeriod {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl DistractionPeriod {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Derived scores for one tutoring session.
///
/// Recomputable at any time from the session record; never stored as the
/// source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Speaking speed over recorded utterances, words per minute.
    pub wpm: f64,
    /// Fraction of speaking time spent in pauses, in [0,1].
    pub pause_rate: f64,
    /// 1.0 means no hints were needed; heavier hints push it lower.
    pub hint_dependency: f64,
    pub concept_coverage: Coverage,
    /// Speaking time minus distraction time, in seconds.
    pub focus_duration_secs: f64,
    pub distraction_periods: Vec<DistractionPeriod>,
}
