//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Endpoint for {0} must be an http(s) URL")]
    InvalidEndpoint(&'static str),

    #[error("Timeout for {0} must be positive")]
    InvalidTimeout(&'static str),

    #[error("Threshold {0} must lie in [0, 1]")]
    ThresholdOutOfRange(&'static str),

    #[error("Result limit {0} must be at least 1")]
    InvalidResultLimit(&'static str),

    #[error("Relaxed similarity floor must not exceed the strict floor")]
    RelaxedFloorAboveStrict,

    #[error("Relaxed result limit must not be below the strict limit")]
    RelaxedLimitBelowStrict,

    #[error("Temperature must lie in [0, 2]")]
    InvalidTemperature,

    #[error("Max tokens must be positive")]
    InvalidMaxTokens,

    #[error("Minimum pause gap must be positive")]
    InvalidPauseGap,

    #[error("Segment channel capacity must be at least 1")]
    InvalidChannelCapacity,

    #[error("Distraction timing values must be positive")]
    InvalidDistractionTiming,
}
