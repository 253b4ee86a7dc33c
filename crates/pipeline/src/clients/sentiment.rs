//! HTTP sentiment scoring client

use super::{build_client, map_transport_error, parse_with_recovery};
use async_trait::async_trait;
use call_qa_core::{AnalysisError, Result, SentimentResult, SentimentScorer};
use call_qa_config::ExternalServicesConfig;
use serde::Deserialize;

const SERVICE: &str = "sentiment";

/// Wire contract: a ranked list of label rows; the top row wins
#[derive(Debug, Deserialize)]
struct SentimentPayload {
    results: Vec<LabelRow>,
}

#[derive(Debug, Deserialize)]
struct LabelRow {
    label: String,
    score: f32,
}

/// Sentiment classification over HTTP
pub struct HttpSentimentScorer {
    url: String,
    api_key: Option<String>,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl HttpSentimentScorer {
    pub fn new(config: &ExternalServicesConfig) -> Result<Self> {
        Ok(Self {
            url: config.sentiment_url.clone(),
            api_key: config.scoring_api_key.clone(),
            timeout_ms: config.timeout_ms,
            client: build_client(config.timeout_ms)?,
        })
    }
}

#[async_trait]
impl SentimentScorer for HttpSentimentScorer {
    async fn score(&self, text: &str) -> Result<SentimentResult> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, self.timeout_ms, e))?;

        if !response.status().is_success() {
            return Err(AnalysisError::unavailable(
                SERVICE,
                format!("upstream returned {}", response.status()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(SERVICE, self.timeout_ms, e))?;
        let payload: SentimentPayload = parse_with_recovery(SERVICE, &body)?;

        let top = payload.results.into_iter().next().ok_or_else(|| {
            AnalysisError::unavailable(SERVICE, "empty result list".to_string())
        })?;

        Ok(SentimentResult::new(top.label, top.score))
    }

    fn service_name(&self) -> &str {
        SERVICE
    }
}
