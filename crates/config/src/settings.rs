//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::evaluation::EvaluationConfig;
use crate::ConfigError;
use call_qa_core::SpeakerRole;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Audio normalization configuration
    #[serde(default)]
    pub audio: AudioConfig,

    /// External capability endpoints and limits
    #[serde(default)]
    pub external: ExternalServicesConfig,

    /// Speaker role resolution configuration
    #[serde(default)]
    pub speakers: SpeakerConfig,

    /// Evaluation scoring configuration
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings; run once at startup
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_audio()?;
        self.validate_external()?;
        self.validate_speakers()?;
        self.evaluation.validate()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.max_in_flight == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_in_flight".to_string(),
                message: "In-flight admission limit must be at least 1".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_audio(&self) -> Result<(), ConfigError> {
        if !(8_000..=48_000).contains(&self.audio.target_sample_rate) {
            return Err(ConfigError::InvalidValue {
                field: "audio.target_sample_rate".to_string(),
                message: format!(
                    "Must be between 8000 and 48000 Hz, got {}",
                    self.audio.target_sample_rate
                ),
            });
        }
        Ok(())
    }

    fn validate_external(&self) -> Result<(), ConfigError> {
        let external = &self.external;

        if external.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "external.timeout_ms".to_string(),
                message: "Timeout must be at least 1ms".to_string(),
            });
        }

        if external.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "external.concurrency".to_string(),
                message: "Scoring concurrency cap must be at least 1".to_string(),
            });
        }

        for (field, url) in [
            ("external.transcription_url", &external.transcription_url),
            ("external.sentiment_url", &external.sentiment_url),
            ("external.tonal_url", &external.tonal_url),
        ] {
            if url.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "Endpoint URL cannot be empty".to_string(),
                });
            }
        }

        // Credentials are optional in development, required in strict modes
        if self.environment.is_strict() && external.transcription_api_key.is_none() {
            return Err(ConfigError::MissingField(
                "external.transcription_api_key".to_string(),
            ));
        }

        Ok(())
    }

    /// Every override label must be one of the canonical roles
    fn validate_speakers(&self) -> Result<(), ConfigError> {
        for (speaker_id, label) in &self.speakers.role_overrides {
            SpeakerRole::parse(label).map_err(|_| ConfigError::InvalidValue {
                field: format!("speakers.role_overrides.{}", speaker_id),
                message: format!("'{}' is not a canonical role (Agent/Customer)", label),
            })?;
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Total in-flight analysis admission limit (protects upstream quotas)
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_in_flight() -> usize {
    8
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            // Empty by default - must be explicitly configured for production
            cors_origins: Vec::new(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

/// Audio normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Canonical sample rate required by the downstream models
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,
}

fn default_target_sample_rate() -> u32 {
    16_000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: default_target_sample_rate(),
        }
    }
}

/// External capability endpoints, credentials, and limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalServicesConfig {
    /// Transcription + diarization endpoint
    #[serde(default = "default_transcription_url")]
    pub transcription_url: String,

    /// Sentiment scoring endpoint
    #[serde(default = "default_sentiment_url")]
    pub sentiment_url: String,

    /// Tonal emotion scoring endpoint
    #[serde(default = "default_tonal_url")]
    pub tonal_url: String,

    /// Bearer key for the transcription service
    /// (set via CALL_QA__EXTERNAL__TRANSCRIPTION_API_KEY)
    #[serde(default)]
    pub transcription_api_key: Option<String>,

    /// Bearer key shared by the sentiment/tonal services
    /// (set via CALL_QA__EXTERNAL__SCORING_API_KEY)
    #[serde(default)]
    pub scoring_api_key: Option<String>,

    /// Per-external-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Concurrent per-segment scoring cap (respects upstream rate limits)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_transcription_url() -> String {
    "http://127.0.0.1:8090/transcribe".to_string()
}
fn default_sentiment_url() -> String {
    "http://127.0.0.1:8091/sentiment".to_string()
}
fn default_tonal_url() -> String {
    "http://127.0.0.1:8091/tonal".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_concurrency() -> usize {
    4
}

impl Default for ExternalServicesConfig {
    fn default() -> Self {
        Self {
            transcription_url: default_transcription_url(),
            sentiment_url: default_sentiment_url(),
            tonal_url: default_tonal_url(),
            transcription_api_key: None,
            scoring_api_key: None,
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
        }
    }
}

/// Speaker role resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpeakerConfig {
    /// Explicit diarizer-id → role overrides for deployments where the
    /// opening-speaker heuristic does not hold (e.g. outbound campaigns).
    /// Labels must be canonical roles; validated at startup.
    #[serde(default)]
    pub role_overrides: HashMap<String, String>,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CALL_QA prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("CALL_QA")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
