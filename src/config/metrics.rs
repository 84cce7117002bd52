//! Session metrics configuration

use serde::Deserialize;

use crate::domain::metrics::MetricsThresholds;

use super::error::ValidationError;

/// Settings for post-session metrics reporting
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Pauses at least this long count as distraction periods
    #[serde(default = "default_distraction_threshold_secs")]
    pub distraction_threshold_secs: f64,

    /// Adjacent pauses closer than this merge into one
    #[serde(default = "default_pause_merge_gap_secs")]
    pub pause_merge_gap_secs: f64,
}

impl MetricsConfig {
    /// Maps this section onto the metrics calculator's thresholds
    pub fn thresholds(&self) -> MetricsThresholds {
        MetricsThresholds {
            distraction_threshold_secs: self.distraction_threshold_secs,
            pause_merge_gap_secs: self.pause_merge_gap_secs,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.distraction_threshold_secs <= 0.0 || self.pause_merge_gap_secs <= 0.0 {
            return Err(ValidationError::InvalidDistractionTiming);
        }

        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            distraction_threshold_secs: default_distraction_threshold_secs(),
            pause_merge_gap_secs: default_pause_merge_gap_secs(),
        }
    }
}

fn default_distraction_threshold_secs() -> f64 {
    15.0
}

fn default_pause_merge_gap_secs() -> f64 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MetricsConfig::default();
        assert!(config.validate().is_ok());

        let thresholds = config.thresholds();
        assert_eq!(thresholds.distraction_threshold_secs, 15.0);
        assert_eq!(thresholds.pause_merge_gap_secs, 2.0);
    }

    #[test]
    fn test_negative_distraction_threshold_rejected() {
        let config = MetricsConfig {
            distraction_threshold_secs: -5.0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidDistractionTiming)
        ));
    }
}
