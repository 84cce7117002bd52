//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `VIVA_COACH_` prefix and nested values use underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use viva_coach::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! let tuning = config.engine_tuning();
//! ```

mod error;
mod generation;
mod metrics;
mod retrieval;
mod speech;
mod tutoring;

pub use error::{ConfigError, ValidationError};
pub use generation::GenerationConfig;
pub use metrics::MetricsConfig;
pub use retrieval::RetrievalConfig;
pub use speech::SpeechConfig;
pub use tutoring::TutoringConfig;

use serde::Deserialize;

use crate::application::EngineTuning;
use crate::domain::dialogue::TransitionThresholds;

/// Root application configuration
///
/// Contains all configuration sections for the Viva Coach conversation core.
/// Load using [`AppConfig::load()`] which reads from environment variables.
/// Every section carries defaults, so an empty environment yields a working
/// development configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Tutoring policy thresholds (silence, coverage, confidence)
    #[serde(default)]
    pub tutoring: TutoringConfig,

    /// Reply generation service (hosted language model)
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval service (vector search over course material)
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Speech transcript ingestion
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Post-session metrics reporting
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `VIVA_COACH` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `VIVA_COACH__TUTORING__SILENCE_TIMEOUT_SECS=8` -> `tutoring.silence_timeout_secs = 8.0`
    /// - `VIVA_COACH__GENERATION__MODEL=...` -> `generation.model = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VIVA_COACH")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Performs semantic validation of configuration:
    /// - Timeouts and gaps positive
    /// - Threshold fractions within [0, 1]
    /// - Relaxed retrieval bounds consistent with the strict bounds
    /// - Endpoint URL schemes
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tutoring.validate()?;
        self.generation.validate()?;
        self.retrieval.validate()?;
        self.speech.validate()?;
        self.metrics.validate()?;
        Ok(())
    }

    /// Assemble the dialogue engine's tuning from the relevant sections
    pub fn engine_tuning(&self) -> EngineTuning {
        EngineTuning {
            thresholds: TransitionThresholds {
                silence_timeout_secs: self.tutoring.silence_timeout_secs,
                consolidation_coverage: self.tutoring.consolidation_coverage,
            },
            min_confidence: self.tutoring.min_confidence,
            stuck_timeout_secs: self.tutoring.stuck_timeout_secs,
            generation_timeout: self.generation.timeout(),
            min_alignment: self.tutoring.min_alignment,
            min_pause_gap_secs: self.speech.min_pause_gap_secs,
        }
    }
}
