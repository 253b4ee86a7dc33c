//! Per-segment sentiment/tonal scoring and per-role aggregation
//!
//! Each non-empty segment is scored independently by the external
//! capabilities. Calls are issued concurrently up to the configured cap
//! and results re-associate with their segment by index, never by
//! completion order. A single segment's timeout or upstream failure
//! degrades that segment to the neutral default instead of failing the
//! call; aggregation tolerates missing per-segment data for a minority of
//! segments.

use crate::aggregate::AggregatedSegments;
use call_qa_core::{
    RoleKey, SentimentResult, SentimentScorer, SpeakerRole, TonalResult, TonalScorer,
};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-segment scores aligned by index with `AggregatedSegments::labeled`
#[derive(Debug, Clone, Default)]
pub struct SegmentScores {
    pub sentiment: Vec<SentimentResult>,
    pub tonal: Vec<TonalResult>,
}

/// Scoring output: per-role aggregates plus the per-segment scores the
/// evaluation engine audits against
#[derive(Debug, Clone)]
pub struct ScoredCall {
    /// Keys: "Agent", "Customer", "Overall"
    pub sentiment_by_role: BTreeMap<String, SentimentResult>,
    /// Keys: "Agent", "Customer", "Overall"
    pub tonal_by_role: BTreeMap<String, TonalResult>,
    pub per_segment: SegmentScores,
}

/// Scores segments through the external capabilities and aggregates the
/// results into bounded per-role distributions
pub struct SentimentTonalScorer {
    sentiment: Arc<dyn SentimentScorer>,
    tonal: Arc<dyn TonalScorer>,
    concurrency: usize,
    timeout: Duration,
}

impl SentimentTonalScorer {
    pub fn new(
        sentiment: Arc<dyn SentimentScorer>,
        tonal: Arc<dyn TonalScorer>,
        concurrency: usize,
        timeout_ms: u64,
    ) -> Self {
        Self {
            sentiment,
            tonal,
            concurrency: concurrency.max(1),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Score every segment and aggregate per role key
    pub async fn score(&self, aggregated: &AggregatedSegments) -> ScoredCall {
        let per_segment = self.score_segments(aggregated).await;

        let mut sentiment_by_role = BTreeMap::new();
        let mut tonal_by_role = BTreeMap::new();

        for key in RoleKey::ALL {
            let indices = Self::indices_for(aggregated, key);

            let sentiments: Vec<&SentimentResult> =
                indices.iter().map(|&i| &per_segment.sentiment[i]).collect();
            let tonals: Vec<&TonalResult> =
                indices.iter().map(|&i| &per_segment.tonal[i]).collect();

            sentiment_by_role.insert(key.label().to_string(), aggregate_sentiment(&sentiments));
            tonal_by_role.insert(key.label().to_string(), aggregate_tonal(&tonals));
        }

        ScoredCall {
            sentiment_by_role,
            tonal_by_role,
            per_segment,
        }
    }

    /// Fan per-segment calls out concurrently, rejoining by index
    async fn score_segments(&self, aggregated: &AggregatedSegments) -> SegmentScores {
        let count = aggregated.labeled.len();
        let mut scores = SegmentScores {
            sentiment: vec![SentimentResult::neutral(); count],
            tonal: vec![TonalResult::neutral_default(); count],
        };

        let inputs: Vec<(usize, String)> = aggregated
            .labeled
            .iter()
            .enumerate()
            .map(|(index, labeled)| (index, labeled.1.text.clone()))
            .collect();

        let results: Vec<(usize, Option<SentimentResult>, Option<TonalResult>)> =
            stream::iter(inputs)
                .map(|(index, text)| {
                    let sentiment = Arc::clone(&self.sentiment);
                    let tonal = Arc::clone(&self.tonal);
                    let timeout = self.timeout;
                    async move {
                        let (sentiment_result, tonal_result) = tokio::join!(
                            tokio::time::timeout(timeout, sentiment.score(&text)),
                            tokio::time::timeout(timeout, tonal.score(&text)),
                        );

                        let sentiment_result = match sentiment_result {
                            Ok(Ok(result)) => Some(result),
                            Ok(Err(e)) => {
                                tracing::warn!(index, error = %e, "Sentiment scoring degraded to neutral");
                                None
                            }
                            Err(_) => {
                                tracing::warn!(index, "Sentiment scoring timed out, degraded to neutral");
                                None
                            }
                        };

                        let tonal_result = match tonal_result {
                            Ok(Ok(result)) => Some(result),
                            Ok(Err(e)) => {
                                tracing::warn!(index, error = %e, "Tonal scoring degraded to neutral");
                                None
                            }
                            Err(_) => {
                                tracing::warn!(index, "Tonal scoring timed out, degraded to neutral");
                                None
                            }
                        };

                        (index, sentiment_result, tonal_result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        for (index, sentiment_result, tonal_result) in results {
            if let Some(result) = sentiment_result {
                scores.sentiment[index] = result;
            }
            if let Some(result) = tonal_result {
                scores.tonal[index] = result;
            }
        }

        scores
    }

    /// Indices into `labeled` belonging to a role key. Overall covers the
    /// full segment set irrespective of role, so unequal talk time cannot
    /// double-weight one party.
    fn indices_for(aggregated: &AggregatedSegments, key: RoleKey) -> Vec<usize> {
        aggregated
            .labeled
            .iter()
            .enumerate()
            .filter(|(_, (role, _))| match key {
                RoleKey::Agent => *role == SpeakerRole::Agent,
                RoleKey::Customer => *role == SpeakerRole::Customer,
                RoleKey::Overall => true,
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Aggregate per-segment sentiments: label is the mode, ties prefer the
/// temporally last segment's label (a call that ends positively should not
/// be dragged down by an early negative moment); score is the mean
/// confidence of the segments agreeing with the mode, clamped to [0, 1].
pub fn aggregate_sentiment(results: &[&SentimentResult]) -> SentimentResult {
    if results.is_empty() {
        return SentimentResult::neutral();
    }

    let mut counts: Vec<(&str, usize, usize)> = Vec::new(); // (label, count, last index)
    for (index, result) in results.iter().enumerate() {
        match counts.iter_mut().find(|(label, _, _)| *label == result.label) {
            Some(entry) => {
                entry.1 += 1;
                entry.2 = index;
            }
            None => counts.push((result.label.as_str(), 1, index)),
        }
    }

    let (mode, _, _) = counts
        .into_iter()
        .max_by_key(|&(_, count, last_index)| (count, last_index))
        .expect("non-empty results");

    let agreeing: Vec<f32> = results
        .iter()
        .filter(|r| r.label == mode)
        .map(|r| r.score)
        .collect();
    let mean = agreeing.iter().sum::<f32>() / agreeing.len() as f32;

    SentimentResult::new(mode, mean)
}

/// Aggregate per-segment tonal distributions: per-label mean, clamped
pub fn aggregate_tonal(results: &[&TonalResult]) -> TonalResult {
    if results.is_empty() {
        return TonalResult::neutral_default();
    }

    let n = results.len() as f32;
    let neutral = results.iter().map(|r| r.neutral).sum::<f32>() / n;
    let negative = results.iter().map(|r| r.negative).sum::<f32>() / n;
    TonalResult::new(neutral, negative)
}
