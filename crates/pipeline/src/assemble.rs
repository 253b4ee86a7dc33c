//! Response assembly
//!
//! The last gate before a report leaves the pipeline: every declared bound
//! is re-checked, and any violation is an internal-consistency failure,
//! a defect in an upstream component rather than bad input.

use crate::aggregate::AggregatedSegments;
use crate::scoring::ScoredCall;
use call_qa_core::{
    AnalysisError, AnalysisResponse, EvaluationMetrics, Result, RoleKey, SpeakerSegment,
};
use call_qa_config::EvaluationConfig;

const COMPONENT: &str = "assembler";

/// Validates every bound and assembles the final report
pub struct ResponseAssembler {
    allowed_verdicts: Vec<String>,
}

impl ResponseAssembler {
    pub fn new(config: &EvaluationConfig) -> Self {
        Self {
            allowed_verdicts: config.buckets.iter().map(|b| b.label.clone()).collect(),
        }
    }

    pub fn assemble(
        &self,
        aggregated: &AggregatedSegments,
        scored: &ScoredCall,
        evaluation: EvaluationMetrics,
        language: Option<String>,
        num_speakers: usize,
    ) -> Result<AnalysisResponse> {
        self.validate_segments(aggregated)?;
        self.validate_scores(scored)?;
        self.validate_evaluation(&evaluation)?;

        let segments = aggregated
            .labeled
            .iter()
            .map(|(role, segment)| {
                SpeakerSegment::new(segment.start, segment.end, *role, segment.text.clone())
            })
            .collect();

        Ok(AnalysisResponse {
            transcription: aggregated.overall_text.clone(),
            segments,
            sentiment: scored.sentiment_by_role.clone(),
            tonal: scored.tonal_by_role.clone(),
            evaluation,
            language,
            num_speakers: Some(num_speakers),
        })
    }

    fn validate_segments(&self, aggregated: &AggregatedSegments) -> Result<()> {
        let mut previous_start = f64::NEG_INFINITY;
        for (index, (_, segment)) in aggregated.labeled.iter().enumerate() {
            if segment.start >= segment.end {
                return Err(AnalysisError::invariant(
                    COMPONENT,
                    format!("segment {} violates start < end", index),
                ));
            }
            if segment.start < previous_start {
                return Err(AnalysisError::invariant(
                    COMPONENT,
                    format!("segment {} breaks temporal ordering", index),
                ));
            }
            if segment.text.is_empty() {
                return Err(AnalysisError::invariant(
                    COMPONENT,
                    format!("segment {} carries empty text", index),
                ));
            }
            previous_start = segment.start;
        }
        Ok(())
    }

    fn validate_scores(&self, scored: &ScoredCall) -> Result<()> {
        for key in RoleKey::ALL {
            let label = key.label();

            let sentiment = scored.sentiment_by_role.get(label).ok_or_else(|| {
                AnalysisError::invariant(COMPONENT, format!("missing sentiment key '{}'", label))
            })?;
            if !(0.0..=1.0).contains(&sentiment.score) {
                return Err(AnalysisError::invariant(
                    COMPONENT,
                    format!("sentiment score for '{}' outside [0, 1]", label),
                ));
            }

            let tonal = scored.tonal_by_role.get(label).ok_or_else(|| {
                AnalysisError::invariant(COMPONENT, format!("missing tonal key '{}'", label))
            })?;
            if !tonal.in_bounds() {
                return Err(AnalysisError::invariant(
                    COMPONENT,
                    format!("tonal values for '{}' outside [0, 1]", label),
                ));
            }
        }
        Ok(())
    }

    fn validate_evaluation(&self, evaluation: &EvaluationMetrics) -> Result<()> {
        if !evaluation.in_bounds() {
            return Err(AnalysisError::invariant(
                COMPONENT,
                "evaluation metrics outside declared bounds".to_string(),
            ));
        }
        if !self.allowed_verdicts.iter().any(|v| *v == evaluation.evaluation) {
            return Err(AnalysisError::invariant(
                COMPONENT,
                format!("verdict '{}' is not a configured bucket label", evaluation.evaluation),
            ));
        }
        Ok(())
    }
}
