//! Error taxonomy for the analysis pipeline
//!
//! Client-facing input faults, upstream capability faults, and internal
//! consistency faults are distinct variants so the server can map each to
//! the right status code and log level.

use thiserror::Error;

/// Result alias used across the pipeline crates
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Analysis pipeline errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input parsed as a known container but could not be decoded
    #[error("Corrupt audio: {0}")]
    CorruptAudio(String),

    /// Input is not a container this service accepts
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Speaker role override hints contradict each other
    #[error("Ambiguous speaker hints: {0}")]
    AmbiguousSpeakers(String),

    /// An upstream capability failed or returned an invalid payload
    #[error("External service unavailable ({service}): {message}")]
    ExternalServiceUnavailable { service: String, message: String },

    /// An upstream capability exceeded its deadline
    #[error("External service timed out ({service}) after {timeout_ms}ms")]
    ExternalServiceTimeout { service: String, timeout_ms: u64 },

    /// An internal bound or ordering invariant was broken.
    /// Indicates a defect in an upstream component, never bad input.
    #[error("Invariant violation in {component}: {message}")]
    InvariantViolation { component: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalysisError {
    /// Construct an upstream-failure error for a named service
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalServiceUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Construct a timeout error for a named service
    pub fn timeout(service: impl Into<String>, timeout_ms: u64) -> Self {
        Self::ExternalServiceTimeout {
            service: service.into(),
            timeout_ms,
        }
    }

    /// Construct an internal-consistency error for a named component
    pub fn invariant(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            component: component.into(),
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to at the service boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Self::CorruptAudio(_) | Self::UnsupportedFormat(_) => 422,
            Self::AmbiguousSpeakers(_) => 400,
            Self::ExternalServiceUnavailable { .. } => 502,
            Self::ExternalServiceTimeout { .. } => 504,
            Self::InvariantViolation { .. } | Self::Io(_) | Self::Config(_) => 500,
        }
    }

    /// True for faults the caller can fix (4xx), false for server-side faults
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
