//! Top-level analysis report and error response types

use crate::evaluation::EvaluationMetrics;
use crate::score::{SentimentResult, TonalResult};
use crate::segment::SpeakerRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One transcript row in the report: a cleaned segment attributed to its
/// resolved role, with display timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeakerSegment {
    pub start: f64,
    pub end: f64,
    /// Resolved role label ("Agent" / "Customer")
    pub speaker: String,
    pub text: String,
    /// SRT-style display timestamp of `start`
    pub timestamp: String,
}

impl SpeakerSegment {
    pub fn new(start: f64, end: f64, role: SpeakerRole, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            speaker: role.label().to_string(),
            text: text.into(),
            timestamp: format_timestamp(start),
        }
    }
}

/// Convert seconds to an SRT-style `HH:MM:SS.mmm` timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0) as u64;
    let minutes = ((seconds % 3600.0) / 60.0) as u64;
    let secs = seconds % 60.0;
    format!("{:02}:{:02}:{:06.3}", hours, minutes, secs)
}

/// The full call analysis report.
///
/// Assembled last, after every bound has been validated; immutable once
/// returned. Sentiment and tonal maps always carry the three role keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Role-labeled transcript in temporal order
    pub transcription: String,
    pub segments: Vec<SpeakerSegment>,
    /// Keys: "Agent", "Customer", "Overall"
    pub sentiment: BTreeMap<String, SentimentResult>,
    /// Keys: "Agent", "Customer", "Overall"
    pub tonal: BTreeMap<String, TonalResult>,
    pub evaluation: EvaluationMetrics,
    pub language: Option<String>,
    pub num_speakers: Option<usize>,
}

/// Structured error payload returned by the service boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            details,
            status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00:00.000");
        assert_eq!(format_timestamp(1.5), "00:00:01.500");
        assert_eq!(format_timestamp(61.25), "00:01:01.250");
        assert_eq!(format_timestamp(3661.0), "01:01:01.000");
    }

    #[test]
    fn test_negative_timestamp_clamps_to_zero() {
        assert_eq!(format_timestamp(-3.0), "00:00:00.000");
    }

    #[test]
    fn test_speaker_segment_carries_role_label() {
        let seg = SpeakerSegment::new(1.0, 2.5, SpeakerRole::Customer, "hello");
        assert_eq!(seg.speaker, "Customer");
        assert_eq!(seg.timestamp, "00:00:01.000");
    }
}
