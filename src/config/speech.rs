//! Speech transcript ingestion configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Settings for the transcript segment stream
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// Inter-word gaps at least this long count as pauses
    #[serde(default = "default_min_pause_gap_secs")]
    pub min_pause_gap_secs: f64,

    /// Bounded capacity of the segment channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl SpeechConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_pause_gap_secs <= 0.0 {
            return Err(ValidationError::InvalidPauseGap);
        }

        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }

        Ok(())
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            min_pause_gap_secs: default_min_pause_gap_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_min_pause_gap_secs() -> f64 {
    0.8
}

fn default_channel_capacity() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpeechConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_pause_gap_secs, 0.8);
        assert_eq!(config.channel_capacity, 32);
    }

    #[test]
    fn test_zero_pause_gap_rejected() {
        let config = SpeechConfig {
            min_pause_gap_secs: 0.0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPauseGap)
        ));
    }

    #[test]
    fn test_zero_channel_capacity_rejected() {
        let config = SpeechConfig {
            channel_capacity: 0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidChannelCapacity)
        ));
    }
}
