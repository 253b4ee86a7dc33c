//! Segment aggregation
//!
//! Cleans raw segment text, partitions segments by resolved role, and
//! produces the role-labeled overall transcript in temporal order.

use call_qa_core::{AnalysisError, Result, RoleAssignment, Segment, SpeakerRole};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SPEAKER_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:SPEAKER|SPK)[_\s-]?(\d+)\b").unwrap());

/// Clean raw transcript text.
///
/// Collapses whitespace runs, trims, and rewrites raw diarization tokens
/// (`SPEAKER_03`, `SPK2`) into human-readable `Speaker 3` form. Idempotent:
/// re-cleaning already-clean text yields the same text.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUNS.replace_all(text, " ");
    let trimmed = collapsed.trim();
    SPEAKER_TOKENS.replace_all(trimmed, "Speaker $1").into_owned()
}

/// Cleaned segments grouped for scoring and display
#[derive(Debug, Clone, Default)]
pub struct AggregatedSegments {
    /// Agent segments in temporal order
    pub agent: Vec<Segment>,
    /// Customer segments in temporal order
    pub customer: Vec<Segment>,
    /// Every cleaned segment in temporal order with its resolved role
    pub labeled: Vec<(SpeakerRole, Segment)>,
    /// Role-labeled display transcript
    pub overall_text: String,
}

impl AggregatedSegments {
    pub fn segments_for(&self, role: SpeakerRole) -> &[Segment] {
        match role {
            SpeakerRole::Agent => &self.agent,
            SpeakerRole::Customer => &self.customer,
        }
    }

    /// Concatenated cleaned text for one role
    pub fn text_for(&self, role: SpeakerRole) -> String {
        self.segments_for(role)
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Groups cleaned segments by resolved role
#[derive(Debug, Clone, Default)]
pub struct SegmentAggregator;

impl SegmentAggregator {
    /// Partition cleaned segments by role, dropping segments whose text is
    /// empty after cleaning. Every surviving segment keeps its temporal
    /// position in both its role partition and the overall transcript.
    pub fn aggregate(
        &self,
        segments: &[Segment],
        assignment: &RoleAssignment,
    ) -> Result<AggregatedSegments> {
        let mut aggregated = AggregatedSegments::default();
        let mut transcript_lines: Vec<String> = Vec::new();

        for segment in segments {
            let text = clean_text(&segment.text);
            if text.is_empty() {
                continue;
            }

            // Role resolution covered every speaker in this segment set;
            // a miss here is an upstream defect
            let role = assignment.role_of(&segment.speaker_id).ok_or_else(|| {
                AnalysisError::invariant(
                    "aggregator",
                    format!("speaker '{}' has no resolved role", segment.speaker_id),
                )
            })?;

            let cleaned = Segment::new(segment.start, segment.end, &segment.speaker_id, text);
            transcript_lines.push(format!("{}: {}", role.label(), cleaned.text));

            match role {
                SpeakerRole::Agent => aggregated.agent.push(cleaned.clone()),
                SpeakerRole::Customer => aggregated.customer.push(cleaned.clone()),
            }
            aggregated.labeled.push((role, cleaned));
        }

        aggregated.overall_text = transcript_lines.join("\n");
        Ok(aggregated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn assignment() -> RoleAssignment {
        let mut roles = HashMap::new();
        roles.insert("S0".to_string(), SpeakerRole::Agent);
        roles.insert("S1".to_string(), SpeakerRole::Customer);
        RoleAssignment::new(roles, 2)
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean_text("  hello   world \n"), "hello world");
    }

    #[test]
    fn test_clean_rewrites_speaker_tokens() {
        assert_eq!(clean_text("SPEAKER_03 said hi"), "Speaker 3 said hi");
        assert_eq!(clean_text("spk2 replied"), "Speaker 2 replied");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let once = clean_text("  SPEAKER_03   said \t hi ");
        let twice = clean_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_partitions_preserve_order() {
        let aggregator = SegmentAggregator;
        let segments = vec![
            Segment::new(0.0, 1.0, "S0", "Hello, how can I help?"),
            Segment::new(1.0, 2.0, "S1", "My order is late"),
            Segment::new(2.0, 3.0, "S0", "Let me check"),
        ];

        let out = aggregator.aggregate(&segments, &assignment()).unwrap();
        assert_eq!(out.agent.len(), 2);
        assert_eq!(out.customer.len(), 1);
        assert!(out.agent[0].start < out.agent[1].start);
        assert_eq!(out.labeled.len(), 3);
    }

    #[test]
    fn test_overall_transcript_is_role_labeled() {
        let aggregator = SegmentAggregator;
        let segments = vec![
            Segment::new(0.0, 1.0, "S0", "Hello"),
            Segment::new(1.0, 2.0, "S1", "Hi"),
        ];

        let out = aggregator.aggregate(&segments, &assignment()).unwrap();
        assert_eq!(out.overall_text, "Agent: Hello\nCustomer: Hi");
    }

    #[test]
    fn test_empty_after_cleaning_is_dropped() {
        let aggregator = SegmentAggregator;
        let segments = vec![
            Segment::new(0.0, 1.0, "S0", "   \t  "),
            Segment::new(1.0, 2.0, "S1", "Actual words"),
        ];

        let out = aggregator.aggregate(&segments, &assignment()).unwrap();
        assert!(out.agent.is_empty());
        assert_eq!(out.customer.len(), 1);
        assert_eq!(out.labeled.len(), 1);
    }

    #[test]
    fn test_unresolved_speaker_is_invariant_violation() {
        let aggregator = SegmentAggregator;
        let segments = vec![Segment::new(0.0, 1.0, "GHOST", "who am I")];

        let err = aggregator.aggregate(&segments, &assignment()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvariantViolation { .. }));
    }

    #[test]
    fn test_role_text_concatenation() {
        let aggregator = SegmentAggregator;
        let segments = vec![
            Segment::new(0.0, 1.0, "S0", "one"),
            Segment::new(1.0, 2.0, "S0", "two"),
        ];

        let out = aggregator.aggregate(&segments, &assignment()).unwrap();
        assert_eq!(out.text_for(SpeakerRole::Agent), "one two");
        assert_eq!(out.text_for(SpeakerRole::Customer), "");
    }
}
