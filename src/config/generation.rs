//! Reply generation service configuration

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

/// Settings for the hosted language model behind the generation port
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the generation API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API key, if the endpoint requires one
    pub api_key: Option<SecretString>,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request deadline in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on generated tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retries on transport failure before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::MissingRequired("generation.endpoint"));
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidEndpoint("generation.endpoint"));
        }

        if self.model.is_empty() {
            return Err(ValidationError::MissingRequired("generation.model"));
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("generation.timeout_secs"));
        }

        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }

        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_tokens() -> u32 {
    400
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_retries() -> u32 {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let config = GenerationConfig {
            endpoint: "ftp://model.internal".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidEndpoint("generation.endpoint"))
        ));
    }

    #[test]
    fn test_empty_model_rejected() {
        let config = GenerationConfig {
            model: String::new(),
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("generation.model"))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = GenerationConfig {
            timeout_secs: 0,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let config = GenerationConfig {
            temperature: 2.5,
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTemperature)
        ));
    }
}
