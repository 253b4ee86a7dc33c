//! Sentiment and tonal scoring capability traits

use crate::error::Result;
use crate::score::{SentimentResult, TonalResult};
use async_trait::async_trait;

/// Sentiment classification interface: text in, label + confidence out.
///
/// Implementations are opaque network capabilities; the pipeline never
/// inspects how the score is computed, only that it satisfies the bounded
/// contract.
#[async_trait]
pub trait SentimentScorer: Send + Sync + 'static {
    /// Score one cleaned segment text
    async fn score(&self, text: &str) -> Result<SentimentResult>;

    /// Service name for logging
    fn service_name(&self) -> &str;
}

/// Tonal emotion scoring interface: text in, fixed-label distribution out
#[async_trait]
pub trait TonalScorer: Send + Sync + 'static {
    /// Score one cleaned segment text
    async fn score(&self, text: &str) -> Result<TonalResult>;

    /// Service name for logging
    fn service_name(&self) -> &str;
}
