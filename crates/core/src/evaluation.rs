//! Composite QA evaluation metrics

use serde::{Deserialize, Serialize};

/// The QA scorecard for one call.
///
/// Sub-scores are integers in [1, 10]; the final rating is their fixed
/// weighted average rounded to one decimal place, and the evaluation label
/// is a deterministic bucket of the final rating. Created exactly once, at
/// the end of the pipeline. Field names follow the report schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationMetrics {
    #[serde(rename = "Resolution")]
    pub resolution: u8,
    #[serde(rename = "Compliance")]
    pub compliance: u8,
    #[serde(rename = "Satisfaction")]
    pub satisfaction: u8,
    #[serde(rename = "Final_rating")]
    pub final_rating: f32,
    #[serde(rename = "Evaluation")]
    pub evaluation: String,
}

impl EvaluationMetrics {
    /// True when every field sits inside its declared bounds
    pub fn in_bounds(&self) -> bool {
        (1..=10).contains(&self.resolution)
            && (1..=10).contains(&self.compliance)
            && (1..=10).contains(&self.satisfaction)
            && (1.0..=10.0).contains(&self.final_rating)
            && !self.evaluation.is_empty()
    }
}
