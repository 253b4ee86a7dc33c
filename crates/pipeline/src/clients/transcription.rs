//! HTTP transcription + diarization client

use super::{build_client, map_transport_error, parse_with_recovery};
use async_trait::async_trait;
use call_qa_core::{
    AnalysisError, Result, Segment, SpeakerHints, Transcriber, Transcription,
};
use call_qa_config::ExternalServicesConfig;
use serde::Deserialize;
use std::path::Path;

const SERVICE: &str = "transcription";

/// Wire contract of the transcription service
#[derive(Debug, Deserialize)]
struct TranscriptionPayload {
    segments: Vec<RawSegment>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    speaker: String,
    text: String,
}

/// Transcription + diarization over HTTP.
///
/// Uploads the normalized WAV as multipart form data together with the
/// speaker-count hints, and validates the returned segment list against
/// the adapter contract before anything downstream sees it.
pub struct HttpTranscriber {
    url: String,
    api_key: Option<String>,
    timeout_ms: u64,
    client: reqwest::Client,
}

impl HttpTranscriber {
    pub fn new(config: &ExternalServicesConfig) -> Result<Self> {
        Ok(Self {
            url: config.transcription_url.clone(),
            api_key: config.transcription_api_key.clone(),
            timeout_ms: config.timeout_ms,
            client: build_client(config.timeout_ms)?,
        })
    }

    /// Enforce the adapter contract: `start < end` per segment and
    /// non-decreasing ordering by `start`. Violations are upstream
    /// defects, not something to silently repair.
    fn validate_contract(payload: &TranscriptionPayload) -> Result<()> {
        let mut previous_start = f64::NEG_INFINITY;
        for (index, segment) in payload.segments.iter().enumerate() {
            if !segment.start.is_finite() || !segment.end.is_finite() {
                return Err(AnalysisError::unavailable(
                    SERVICE,
                    format!("segment {} carries non-finite timestamps", index),
                ));
            }
            if segment.start >= segment.end {
                return Err(AnalysisError::unavailable(
                    SERVICE,
                    format!(
                        "segment {} violates start < end ({} >= {})",
                        index, segment.start, segment.end
                    ),
                ));
            }
            if segment.start < previous_start {
                return Err(AnalysisError::unavailable(
                    SERVICE,
                    format!("segment {} breaks temporal ordering", index),
                ));
            }
            previous_start = segment.start;
        }
        Ok(())
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio_path: &Path, hints: &SpeakerHints) -> Result<Transcription> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| AnalysisError::unavailable(SERVICE, e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("min_speakers", hints.min_speakers.to_string())
            .text("max_speakers", hints.max_speakers.to_string());

        let mut request = self.client.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, self.timeout_ms, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::unavailable(
                SERVICE,
                format!("upstream returned {}: {}", status, body),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(SERVICE, self.timeout_ms, e))?;
        let payload: TranscriptionPayload = parse_with_recovery(SERVICE, &body)?;
        Self::validate_contract(&payload)?;

        tracing::debug!(
            segments = payload.segments.len(),
            language = payload.language.as_deref().unwrap_or("unknown"),
            "Transcription received"
        );

        Ok(Transcription {
            segments: payload
                .segments
                .into_iter()
                .map(|s| Segment::new(s.start, s.end, s.speaker, s.text))
                .collect(),
            language: payload.language,
        })
    }

    fn service_name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(rows: Vec<(f64, f64)>) -> TranscriptionPayload {
        TranscriptionPayload {
            segments: rows
                .into_iter()
                .map(|(start, end)| RawSegment {
                    start,
                    end,
                    speaker: "A".to_string(),
                    text: "hello".to_string(),
                })
                .collect(),
            language: Some("en".to_string()),
        }
    }

    #[test]
    fn test_contract_accepts_ordered_segments() {
        let ok = payload(vec![(0.0, 1.0), (1.0, 2.5), (2.5, 3.0)]);
        assert!(HttpTranscriber::validate_contract(&ok).is_ok());
    }

    #[test]
    fn test_contract_accepts_empty_result() {
        // Silence-only audio is a valid empty result
        let empty = payload(vec![]);
        assert!(HttpTranscriber::validate_contract(&empty).is_ok());
    }

    #[test]
    fn test_contract_rejects_inverted_bounds() {
        let bad = payload(vec![(1.0, 1.0)]);
        assert!(HttpTranscriber::validate_contract(&bad).is_err());
    }

    #[test]
    fn test_contract_rejects_out_of_order() {
        let bad = payload(vec![(2.0, 3.0), (0.5, 1.0)]);
        assert!(HttpTranscriber::validate_contract(&bad).is_err());
    }

    #[test]
    fn test_payload_shape() {
        let body = r#"{
            "segments": [
                {"start": 0.0, "end": 1.2, "speaker": "SPEAKER_00", "text": "Hello"},
                {"start": 1.2, "end": 2.0, "speaker": "SPEAKER_01", "text": "Hi"}
            ],
            "language": "en"
        }"#;
        let parsed: TranscriptionPayload = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.segments.len(), 2);
        assert_eq!(parsed.segments[1].speaker, "SPEAKER_01");
    }
}
