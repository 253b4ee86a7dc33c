//! Configuration management for the call QA service
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (CALL_QA prefix, `__` separator)
//!
//! Everything is validated once at process startup and passed by reference
//! into the components that need it; no ambient lookups inside business
//! logic.

pub mod evaluation;
pub mod settings;

pub use evaluation::{
    ComplianceRule, ComplianceRuleKind, EvaluationConfig, RatingBucket, RatingWeights,
    ResolutionBucket,
};
pub use settings::{
    load_settings, AudioConfig, ExternalServicesConfig, ObservabilityConfig, RuntimeEnvironment,
    ServerConfig, Settings, SpeakerConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
