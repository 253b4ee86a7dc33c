//! HTTP clients for the consumed external capabilities
//!
//! Every client parses the upstream payload into a fixed serde contract at
//! the boundary and fails fast on shape mismatch; loosely-typed values
//! never travel past this module.

mod sentiment;
mod tonal;
mod transcription;

pub use sentiment::HttpSentimentScorer;
pub use tonal::HttpTonalScorer;
pub use transcription::HttpTranscriber;

use call_qa_core::{AnalysisError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build a reqwest client with the configured per-call timeout
pub(crate) fn build_client(timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| AnalysisError::unavailable("http-client", e.to_string()))
}

/// Map a reqwest transport error to the taxonomy for a named service
pub(crate) fn map_transport_error(
    service: &str,
    timeout_ms: u64,
    err: reqwest::Error,
) -> AnalysisError {
    if err.is_timeout() {
        AnalysisError::timeout(service, timeout_ms)
    } else {
        AnalysisError::unavailable(service, err.to_string())
    }
}

/// Strict parse with a documented fallback stage.
///
/// Some upstreams wrap their JSON payload in log noise or markdown fences.
/// The primary path is a strict typed parse of the whole body; when that
/// fails, the fallback extracts the outermost balanced object (first `{`
/// to last `}`) and retries the same strict typed parse on it. Anything
/// else is a contract breach.
pub(crate) fn parse_with_recovery<T: DeserializeOwned>(service: &str, body: &str) -> Result<T> {
    match serde_json::from_str::<T>(body) {
        Ok(parsed) => Ok(parsed),
        Err(strict_err) => match recover_embedded_json(body) {
            Some(candidate) => serde_json::from_str::<T>(candidate).map_err(|e| {
                AnalysisError::unavailable(
                    service,
                    format!("embedded JSON did not match the contract: {}", e),
                )
            }),
            None => Err(AnalysisError::unavailable(
                service,
                format!("response did not match the contract: {}", strict_err),
            )),
        },
    }
}

/// Slice the outermost `{ ... }` span out of a noisy body, if any
pub(crate) fn recover_embedded_json(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&body[start..=end])
}
