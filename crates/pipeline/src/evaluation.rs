//! Evaluation scoring engine
//!
//! A deterministic, auditable scoring function: every sub-score traces
//! back to the configured mapping table, rule set, or weight, never to
//! raw text directly.

use crate::aggregate::AggregatedSegments;
use crate::scoring::ScoredCall;
use call_qa_core::{EvaluationMetrics, RoleKey, SentimentResult, SpeakerRole, TonalResult};
use call_qa_config::{ComplianceRuleKind, EvaluationConfig};
use regex::Regex;

struct CompiledRule {
    id: String,
    kind: ComplianceRuleKind,
    pattern: Regex,
    points: u8,
}

/// Combines aggregated signals and rule checks into the bounded composite
/// rating and categorical verdict
pub struct EvaluationEngine {
    config: EvaluationConfig,
    rules: Vec<CompiledRule>,
}

impl EvaluationEngine {
    /// Compile the configured rule set. Patterns were validated at config
    /// load; a rule that fails to compile here is skipped with a warning
    /// rather than taking the engine down.
    pub fn new(config: EvaluationConfig) -> Self {
        let rules = config
            .compliance_rules
            .iter()
            .filter_map(|rule| match Regex::new(&rule.pattern) {
                Ok(pattern) => Some(CompiledRule {
                    id: rule.id.clone(),
                    kind: rule.kind,
                    pattern,
                    points: rule.points,
                }),
                Err(e) => {
                    tracing::warn!(rule = %rule.id, error = %e, "Skipping uncompilable compliance rule");
                    None
                }
            })
            .collect();

        Self { config, rules }
    }

    /// Produce the scorecard from fully-aggregated inputs
    pub fn evaluate(
        &self,
        aggregated: &AggregatedSegments,
        scored: &ScoredCall,
    ) -> EvaluationMetrics {
        let resolution = self.resolution_score(aggregated, scored);
        let compliance = self.compliance_score(&aggregated.text_for(SpeakerRole::Agent));
        let satisfaction = self.satisfaction_score(
            scored
                .tonal_by_role
                .get(RoleKey::Customer.label())
                .copied()
                .unwrap_or_else(TonalResult::neutral_default),
        );

        let weights = &self.config.weights;
        let weighted = resolution as f32 * weights.resolution
            + compliance as f32 * weights.compliance
            + satisfaction as f32 * weights.satisfaction;
        // One decimal place; out-of-bounds arithmetic is corrected here,
        // never surfaced to the caller
        let final_rating = ((weighted * 10.0).round() / 10.0).clamp(1.0, 10.0);

        let evaluation = self.config.verdict_for(final_rating).to_string();

        EvaluationMetrics {
            resolution: resolution.clamp(1, 10),
            compliance: compliance.clamp(1, 10),
            satisfaction: satisfaction.clamp(1, 10),
            final_rating,
            evaluation,
        }
    }

    /// Resolution tracks how the customer ended the call: the final
    /// customer segment's sentiment label and confidence run through the
    /// configured mapping table. A customer with no segments ends on the
    /// neutral default, which maps through the non-negative column.
    fn resolution_score(&self, aggregated: &AggregatedSegments, scored: &ScoredCall) -> u8 {
        let ending = aggregated
            .labeled
            .iter()
            .enumerate()
            .rev()
            .find(|(_, (role, _))| *role == SpeakerRole::Customer)
            .map(|(index, _)| scored.per_segment.sentiment[index].clone())
            .unwrap_or_else(SentimentResult::neutral);

        self.config
            .resolution_for(ending.is_negative(), ending.score)
    }

    /// Compliance starts at the baseline of 10; every violated rule
    /// deducts its configured points; floored at 1
    fn compliance_score(&self, agent_text: &str) -> u8 {
        let mut score: i32 = 10;

        for rule in &self.rules {
            let matched = rule.pattern.is_match(agent_text);
            let violated = match rule.kind {
                ComplianceRuleKind::RequiredPhrase => !matched,
                ComplianceRuleKind::ProhibitedPhrase => matched,
            };
            if violated {
                tracing::debug!(rule = %rule.id, points = rule.points, "Compliance rule violated");
                score -= rule.points as i32;
            }
        }

        score.clamp(1, 10) as u8
    }

    /// Satisfaction weights the customer's Negative tonal value down from
    /// the baseline of 10
    fn satisfaction_score(&self, customer_tonal: TonalResult) -> u8 {
        let deduction = customer_tonal.negative * self.config.satisfaction_negative_weight;
        let score = (10.0 - deduction).round() as i32;
        score.clamp(1, 10) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SegmentAggregator;
    use crate::scoring::SegmentScores;
    use call_qa_core::{RoleAssignment, Segment};
    use std::collections::{BTreeMap, HashMap};

    fn engine() -> EvaluationEngine {
        EvaluationEngine::new(EvaluationConfig::default())
    }

    fn aggregated(rows: &[(&str, &str)]) -> AggregatedSegments {
        let mut roles = HashMap::new();
        roles.insert("S0".to_string(), SpeakerRole::Agent);
        roles.insert("S1".to_string(), SpeakerRole::Customer);
        let assignment = RoleAssignment::new(roles, 2);

        let segments: Vec<Segment> = rows
            .iter()
            .enumerate()
            .map(|(i, (speaker, text))| Segment::new(i as f64, i as f64 + 1.0, *speaker, *text))
            .collect();

        SegmentAggregator.aggregate(&segments, &assignment).unwrap()
    }

    fn scored_with(
        per_segment_sentiment: Vec<SentimentResult>,
        customer_tonal: TonalResult,
    ) -> ScoredCall {
        let count = per_segment_sentiment.len();
        let mut tonal_by_role = BTreeMap::new();
        tonal_by_role.insert("Agent".to_string(), TonalResult::neutral_default());
        tonal_by_role.insert("Customer".to_string(), customer_tonal);
        tonal_by_role.insert("Overall".to_string(), customer_tonal);

        let mut sentiment_by_role = BTreeMap::new();
        for key in ["Agent", "Customer", "Overall"] {
            sentiment_by_role.insert(key.to_string(), SentimentResult::neutral());
        }

        ScoredCall {
            sentiment_by_role,
            tonal_by_role,
            per_segment: SegmentScores {
                sentiment: per_segment_sentiment,
                tonal: vec![TonalResult::neutral_default(); count],
            },
        }
    }

    #[test]
    fn test_negative_ending_lowers_resolution() {
        let agg = aggregated(&[
            ("S0", "Hello, how can I help? This call may be recorded."),
            ("S1", "This is terrible!"),
        ]);
        let scored = scored_with(
            vec![
                SentimentResult::new("Positive", 0.8),
                SentimentResult::new("Negative", 0.9),
            ],
            TonalResult::new(0.3, 0.7),
        );

        let metrics = engine().evaluate(&agg, &scored);
        assert_eq!(metrics.resolution, 2);
        assert!(metrics.in_bounds());
    }

    #[test]
    fn test_positive_turnaround_restores_resolution() {
        // The customer ends positive after an early negative moment
        let agg = aggregated(&[
            ("S0", "Hello, how can I help?"),
            ("S1", "This is terrible!"),
            ("S1", "Oh, that fixed it, thank you!"),
        ]);
        let scored = scored_with(
            vec![
                SentimentResult::new("Positive", 0.8),
                SentimentResult::new("Negative", 0.9),
                SentimentResult::new("Positive", 0.85),
            ],
            TonalResult::new(0.6, 0.2),
        );

        let metrics = engine().evaluate(&agg, &scored);
        assert_eq!(metrics.resolution, 9);
    }

    #[test]
    fn test_compliance_deducts_for_missing_disclosure() {
        let e = engine();
        // Greeting present, recording disclosure absent: 10 - 2
        assert_eq!(e.compliance_score("Hello, how can I help you today?"), 8);
        // Both present
        assert_eq!(
            e.compliance_score("Hello, this call may be recorded for quality."),
            10
        );
        // Greeting present but prohibited language used: 10 - 2 - 3
        assert_eq!(e.compliance_score("Hello, that idea is stupid"), 5);
    }

    #[test]
    fn test_compliance_floors_at_one() {
        let mut config = EvaluationConfig::default();
        for rule in &mut config.compliance_rules {
            rule.points = 10;
        }
        let e = EvaluationEngine::new(config);
        assert_eq!(e.compliance_score(""), 1);
    }

    #[test]
    fn test_satisfaction_tracks_negative_tone() {
        let e = engine();
        assert_eq!(e.satisfaction_score(TonalResult::new(0.9, 0.0)), 10);
        assert_eq!(e.satisfaction_score(TonalResult::new(0.1, 0.5)), 6);
        assert_eq!(e.satisfaction_score(TonalResult::new(0.0, 1.0)), 1);
    }

    #[test]
    fn test_final_rating_is_weighted_and_bounded() {
        let agg = aggregated(&[
            ("S0", "Hello, this call may be recorded. How can I help?"),
            ("S1", "Great, thanks!"),
        ]);
        let scored = scored_with(
            vec![
                SentimentResult::new("Positive", 0.9),
                SentimentResult::new("Positive", 0.9),
            ],
            TonalResult::new(0.8, 0.0),
        );

        let metrics = engine().evaluate(&agg, &scored);
        // Resolution 9, Compliance 10, Satisfaction 10 → (29/3) ≈ 9.7
        assert_eq!(metrics.resolution, 9);
        assert_eq!(metrics.compliance, 10);
        assert_eq!(metrics.satisfaction, 10);
        assert!((metrics.final_rating - 9.7).abs() < 1e-6);
        assert_eq!(metrics.evaluation, "Excellent");
        assert!(metrics.in_bounds());
    }

    #[test]
    fn test_verdict_consistent_with_thresholds() {
        let agg = aggregated(&[("S0", "no greeting words here at all"), ("S1", "terrible")]);
        let scored = scored_with(
            vec![
                SentimentResult::new("Negative", 0.9),
                SentimentResult::new("Negative", 0.9),
            ],
            TonalResult::new(0.0, 1.0),
        );

        let metrics = engine().evaluate(&agg, &scored);
        // Resolution 2, Compliance 7, Satisfaction 1 → 3.3 → Poor
        assert_eq!(metrics.resolution, 2);
        assert_eq!(metrics.compliance, 7);
        assert_eq!(metrics.satisfaction, 1);
        assert!((metrics.final_rating - 3.3).abs() < 1e-6);
        assert_eq!(metrics.evaluation, "Poor");
    }

    #[test]
    fn test_empty_call_yields_neutral_scorecard() {
        let agg = aggregated(&[]);
        let scored = scored_with(vec![], TonalResult::neutral_default());

        let metrics = engine().evaluate(&agg, &scored);
        // Neutral ending → non-negative low-confidence bucket
        assert_eq!(metrics.resolution, 7);
        assert_eq!(metrics.satisfaction, 10);
        assert!(metrics.in_bounds());
    }
}
