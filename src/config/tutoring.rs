//! Tutoring policy configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Thresholds that drive dialogue phase transitions and turn handling
#[derive(Debug, Clone, Deserialize)]
pub struct TutoringConfig {
    /// Seconds of silence before the coach volunteers a hint
    #[serde(default = "default_silence_timeout_secs")]
    pub silence_timeout_secs: f64,

    /// Concept coverage fraction at which consolidation begins
    #[serde(default = "default_consolidation_coverage")]
    pub consolidation_coverage: f64,

    /// Seconds without a phase change before the session is reset to idle
    #[serde(default = "default_stuck_timeout_secs")]
    pub stuck_timeout_secs: f64,

    /// Transcripts below this confidence trigger a repeat request
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Replies overlapping retrieved material less than this are discarded
    #[serde(default = "default_min_alignment")]
    pub min_alignment: f64,
}

impl TutoringConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.silence_timeout_secs <= 0.0 {
            return Err(ValidationError::InvalidTimeout("tutoring.silence_timeout_secs"));
        }

        if self.stuck_timeout_secs <= 0.0 {
            return Err(ValidationError::InvalidTimeout("tutoring.stuck_timeout_secs"));
        }

        if !(0.0..=1.0).contains(&self.consolidation_coverage) {
            return Err(ValidationError::ThresholdOutOfRange(
                "tutoring.consolidation_coverage",
            ));
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ValidationError::ThresholdOutOfRange("tutoring.min_confidence"));
        }

        if !(0.0..=1.0).contains(&self.min_alignment) {
            return Err(ValidationError::ThresholdOutOfRange("tutoring.min_alignment"));
        }

        Ok(())
    }
}

impl Default for TutoringConfig {
    fn default() -> Self {
        Self {
            silence_timeout_secs: default_silence_timeout_secs(),
            consolidation_coverage: default_consolidation_coverage(),
            stuck_timeout_secs: default_stuck_timeout_secs(),
            min_confidence: default_min_confidence(),
            min_alignment: default_min_alignment(),
        }
    }
}

fn default_silence_timeout_secs() -> f64 {
    10.0
}

fn default_consolidation_coverage() -> f64 {
    0.90
}

fn default_stuck_timeout_secs() -> f64 {
    120.0
}

fn default_min_confidence() -> f64 {
    0.60
}

fn default_min_alignment() -> f64 {
    0.12
}
