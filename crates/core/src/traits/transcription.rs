//! Transcription + diarization capability trait

use crate::error::Result;
use crate::segment::{SpeakerHints, Transcription};
use async_trait::async_trait;
use std::path::Path;

/// Transcription + diarization interface.
///
/// The capability receives the normalized audio artifact and speaker-count
/// hints and returns temporally ordered, speaker-tagged raw segments plus
/// the detected language. Segment text is raw at this boundary; cleaning
/// happens downstream. Silence-only audio yields an empty segment list,
/// which is a valid successful result, not an error.
///
/// # Example
///
/// ```ignore
/// let transcriber: Arc<dyn Transcriber> = Arc::new(HttpTranscriber::new(config)?);
/// let transcription = transcriber.transcribe(artifact.path(), &hints).await?;
/// println!("{} segments", transcription.segments.len());
/// ```
#[async_trait]
pub trait Transcriber: Send + Sync + 'static {
    /// Transcribe and diarize one normalized recording
    async fn transcribe(&self, audio_path: &Path, hints: &SpeakerHints) -> Result<Transcription>;

    /// Service name for logging
    fn service_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::Segment;

    struct MockTranscriber;

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(
            &self,
            _audio_path: &Path,
            _hints: &SpeakerHints,
        ) -> Result<Transcription> {
            Ok(Transcription {
                segments: vec![Segment::new(0.0, 1.0, "A", "hello")],
                language: Some("en".to_string()),
            })
        }

        fn service_name(&self) -> &str {
            "mock-transcriber"
        }
    }

    #[tokio::test]
    async fn test_mock_transcriber() {
        let transcriber = MockTranscriber;
        let result = transcriber
            .transcribe(Path::new("/tmp/none.wav"), &SpeakerHints::default())
            .await
            .unwrap();
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.language.as_deref(), Some("en"));
    }
}
