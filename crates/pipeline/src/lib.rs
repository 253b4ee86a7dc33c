//! Call analysis pipeline
//!
//! This crate provides the stages that turn an uploaded recording into a
//! QA report:
//! - Audio normalization to the canonical mono WAV
//! - HTTP adapters for the transcription, sentiment, and tonal capabilities
//! - Speaker role resolution (Agent / Customer)
//! - Segment cleaning and aggregation
//! - Concurrent per-segment scoring with bounded fan-out
//! - The deterministic evaluation scoring engine
//! - Response assembly with invariant re-validation

pub mod aggregate;
pub mod analyzer;
pub mod assemble;
pub mod clients;
pub mod evaluation;
pub mod normalize;
pub mod roles;
pub mod scoring;

pub use aggregate::{clean_text, AggregatedSegments, SegmentAggregator};
pub use analyzer::CallAnalyzer;
pub use assemble::ResponseAssembler;
pub use clients::{HttpSentimentScorer, HttpTonalScorer, HttpTranscriber};
pub use evaluation::EvaluationEngine;
pub use normalize::{AudioNormalizer, NormalizedAudio};
pub use roles::SpeakerRoleResolver;
pub use scoring::{ScoredCall, SegmentScores, SentimentTonalScorer};
