//! Traits for the pluggable external capabilities

mod scoring;
mod transcription;

pub use scoring::{SentimentScorer, TonalScorer};
pub use transcription::Transcriber;
