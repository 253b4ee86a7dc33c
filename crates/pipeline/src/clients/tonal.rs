//! HTTP tonal emotion scoring client

use super::{build_client, map_transport_error, parse_with_recovery};
use async_trait::async_trait;
use call_qa_core::{AnalysisError, Result, TonalResult, TonalScorer};
use call_qa_config::ExternalServicesConfig;
use serde::Deserialize;

const SERVICE: &str = "tonal";

/// Wire contract: emotion label rows. The upstream model may emit more
/// labels than the report's fixed set; only the fixed labels are
/// projected, and a label the upstream omits reads as 0.0.
#[derive(Debug, Deserialize)]
struct TonalPayload {
    results: Vec<EmotionRow>,
}

#[derive(Debug, Deserialize)]
struct EmotionRow {
    label: String,
    score: f32,
}

/// Tonal emotion scoring over HTTP
pub struct HttpTonalScorer {
    url: String,
    api_key: Option<String>,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl HttpTonalScorer {
    pub fn new(config: &ExternalServicesConfig) -> Result<Self> {
        Ok(Self {
            url: config.tonal_url.clone(),
            api_key: config.scoring_api_key.clone(),
            timeout_ms: config.timeout_ms,
            client: build_client(config.timeout_ms)?,
        })
    }

    fn project(payload: TonalPayload) -> TonalResult {
        let mut neutral = 0.0;
        let mut negative = 0.0;
        for row in payload.results {
            if row.label.eq_ignore_ascii_case("neutral") {
                neutral = row.score;
            } else if row.label.eq_ignore_ascii_case("negative") {
                negative = row.score;
            }
        }
        TonalResult::new(neutral, negative)
    }
}

#[async_trait]
impl TonalScorer for HttpTonalScorer {
    async fn score(&self, text: &str) -> Result<TonalResult> {
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
        let payload: TonalPayload = parse_with_recovery(SERVICE, &body)?;

        Ok(Self::project(payload))
    }

    fn service_name(&self) -> &str {
        SERVICE
    }
}
