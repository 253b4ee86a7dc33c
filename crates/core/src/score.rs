//! Sentiment and tonal score types

use serde::{Deserialize, Serialize};

/// Sentiment label used when a role produced no signal
pub const NEUTRAL_SENTIMENT_LABEL: &str = "Neutral";

/// A sentiment classification: free-form label plus confidence in [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentResult {
    pub label: String,
    pub score: f32,
}

impl SentimentResult {
    /// Build a result with the score clamped into [0, 1]
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score: score.clamp(0.0, 1.0),
        }
    }

    /// Default emitted for roles with no scoreable segments
    pub fn neutral() -> Self {
        Self {
            label: NEUTRAL_SENTIMENT_LABEL.to_string(),
            score: 0.0,
        }
    }

    /// A negative classification, case-insensitive on the label
    pub fn is_negative(&self) -> bool {
        self.label.eq_ignore_ascii_case("negative")
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Fixed-label tonal emotion distribution.
///
/// Both values are independently bounded in [0, 1]; no sum-to-1
/// constraint is imposed. Serialized with the report schema's
/// capitalized keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct TonalResult {
    #[serde(rename = "Neutral")]
    pub neutral: f32,
    #[serde(rename = "Negative")]
    pub negative: f32,
}

impl TonalResult {
    /// Build a result with both values clamped into [0, 1]
    pub fn new(neutral: f32, negative: f32) -> Self {
        Self {
            neutral: neutral.clamp(0.0, 1.0),
            negative: negative.clamp(0.0, 1.0),
        }
    }

    /// Default emitted for roles with no scoreable segments: both keys
    /// present, both zero.
    pub fn neutral_default() -> Self {
        Self::default()
    }

    pub fn in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.neutral) && (0.0..=1.0).contains(&self.negative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_clamping() {
        assert_eq!(SentimentResult::new("Positive", 1.7).score, 1.0);
        assert_eq!(SentimentResult::new("Negative", -0.2).score, 0.0);
        assert_eq!(SentimentResult::new("Neutral", 0.42).score, 0.42);
    }

    #[test]
    fn test_negative_detection() {
        assert!(SentimentResult::new("NEGATIVE", 0.9).is_negative());
        assert!(SentimentResult::new("negative", 0.9).is_negative());
        assert!(!SentimentResult::new("Positive", 0.9).is_negative());
        assert!(!SentimentResult::neutral().is_negative());
    }

    #[test]
    fn test_tonal_clamping_and_bounds() {
        let t = TonalResult::new(1.3, -0.5);
        assert_eq!(t.neutral, 1.0);
        assert_eq!(t.negative, 0.0);
        assert!(t.in_bounds());
    }

    #[test]
    fn test_neutral_default_has_both_keys() {
        let json = serde_json::to_value(TonalResult::neutral_default()).unwrap();
        assert_eq!(json["Neutral"], 0.0);
        assert_eq!(json["Negative"], 0.0);
    }
}
