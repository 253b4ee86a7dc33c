//! Core traits and types for the call QA analysis pipeline
//!
//! This crate provides the foundational types used across all other crates:
//! - Decoded audio clip primitives (downmix, resampling)
//! - Diarized segments, speaker roles, and role assignment
//! - Sentiment / tonal score types with bounded constructors
//! - The composite evaluation scorecard
//! - The analysis report and error response schemas
//! - Error taxonomy
//! - Traits for the consumed external capabilities

pub mod audio;
pub mod error;
pub mod evaluation;
pub mod response;
pub mod score;
pub mod segment;
pub mod traits;

pub use audio::AudioClip;
pub use error::{AnalysisError, Result};
pub use evaluation::EvaluationMetrics;
pub use response::{format_timestamp, AnalysisResponse, ErrorResponse, SpeakerSegment};
pub use score::{SentimentResult, TonalResult, NEUTRAL_SENTIMENT_LABEL};
pub use segment::{
    RoleAssignment, RoleKey, Segment, SpeakerHints, SpeakerRole, Transcription,
};

pub use traits::{SentimentScorer, TonalScorer, Transcriber};
