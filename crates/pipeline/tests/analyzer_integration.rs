//! End-to-end pipeline tests over mock capability implementations

use async_trait::async_trait;
use call_qa_config::Settings;
use call_qa_core::{
    AnalysisError, Result, Segment, SentimentResult, SentimentScorer, SpeakerHints, TonalResult,
    TonalScorer, Transcriber, Transcription,
};
use call_qa_pipeline::CallAnalyzer;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One second of quiet 16 kHz mono WAV
fn wav_upload() -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..16_000 {
            writer.write_sample(((i % 50) as i16) * 40).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Returns a fixed segment script
struct ScriptedTranscriber {
    segments: Vec<Segment>,
    language: Option<String>,
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _audio_path: &Path, _hints: &SpeakerHints) -> Result<Transcription> {
        Ok(Transcription {
            segments: self.segments.clone(),
            language: self.language.clone(),
        })
    }

    fn service_name(&self) -> &str {
        "scripted-transcriber"
    }
}

/// Records the artifact path it was handed, then times out
struct TimeoutTranscriber {
    seen_path: Mutex<Option<PathBuf>>,
}

#[async_trait]
impl Transcriber for TimeoutTranscriber {
    async fn transcribe(&self, audio_path: &Path, _hints: &SpeakerHints) -> Result<Transcription> {
        *self.seen_path.lock().unwrap() = Some(audio_path.to_path_buf());
        Err(AnalysisError::timeout("transcription", 30_000))
    }

    fn service_name(&self) -> &str {
        "timeout-transcriber"
    }
}

struct KeywordSentiment;

#[async_trait]
impl SentimentScorer for KeywordSentiment {
    async fn score(&self, text: &str) -> Result<SentimentResult> {
        if text.contains("terrible") {
            Ok(SentimentResult::new("Negative", 0.9))
        } else if text.contains("thank") {
            Ok(SentimentResult::new("Positive", 0.85))
        } else {
            Ok(SentimentResult::new("Neutral", 0.6))
        }
    }

    fn service_name(&self) -> &str {
        "keyword-sentiment"
    }
}

struct KeywordTonal;

#[async_trait]
impl TonalScorer for KeywordTonal {
    async fn score(&self, text: &str) -> Result<TonalResult> {
        if text.contains("terrible") {
            Ok(TonalResult::new(0.1, 0.8))
        } else {
            Ok(TonalResult::new(0.7, 0.1))
        }
    }

    fn service_name(&self) -> &str {
        "keyword-tonal"
    }
}

/// Hangs long enough to trip the configured scoring timeout on one
/// specific segment text
struct SlowOnKeywordTonal {
    keyword: &'static str,
}

#[async_trait]
impl TonalScorer for SlowOnKeywordTonal {
    async fn score(&self, text: &str) -> Result<TonalResult> {
        if text.contains(self.keyword) {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Ok(TonalResult::new(0.5, 0.5))
    }

    fn service_name(&self) -> &str {
        "slow-tonal"
    }
}

fn analyzer_with(
    transcriber: Arc<dyn Transcriber>,
    settings: &Settings,
) -> CallAnalyzer {
    CallAnalyzer::new(
        settings,
        transcriber,
        Arc::new(KeywordSentiment),
        Arc::new(KeywordTonal),
    )
    .unwrap()
}

fn two_speaker_script() -> Vec<Segment> {
    vec![
        Segment::new(0.0, 2.0, "SPEAKER_00", "Hello, how can I help?"),
        Segment::new(2.0, 4.0, "SPEAKER_01", "This is terrible!"),
    ]
}

#[tokio::test]
async fn two_speaker_call_attributes_roles_and_scores() {
    let transcriber = Arc::new(ScriptedTranscriber {
        segments: two_speaker_script(),
        language: Some("en".to_string()),
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let response = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap();

    // Agent opens the call
    assert_eq!(response.segments[0].speaker, "Agent");
    assert_eq!(response.segments[1].speaker, "Customer");
    assert_eq!(response.num_speakers, Some(2));
    assert_eq!(response.language.as_deref(), Some("en"));

    // Customer mode is Negative, and the negative ending drags Resolution
    assert_eq!(response.sentiment["Customer"].label, "Negative");
    assert_eq!(response.evaluation.resolution, 2);

    // Every bound holds on the way out
    assert!(response.evaluation.in_bounds());
    for key in ["Agent", "Customer", "Overall"] {
        assert!((0.0..=1.0).contains(&response.sentiment[key].score));
        assert!(response.tonal[key].in_bounds());
    }
}

#[tokio::test]
async fn positive_ending_restores_resolution() {
    let mut segments = two_speaker_script();
    segments.push(Segment::new(
        4.0,
        6.0,
        "SPEAKER_01",
        "Oh that fixed it, thank you!",
    ));
    let transcriber = Arc::new(ScriptedTranscriber {
        segments,
        language: Some("en".to_string()),
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let response = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap();

    // A later positive customer segment outweighs the early negative one
    assert_eq!(response.evaluation.resolution, 9);
}

#[tokio::test]
async fn single_speaker_call_reports_neutral_customer() {
    let transcriber = Arc::new(ScriptedTranscriber {
        segments: vec![Segment::new(
            0.0,
            3.0,
            "SPEAKER_00",
            "You have reached our voicemail, please call back",
        )],
        language: Some("en".to_string()),
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let response = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap();

    assert_eq!(response.num_speakers, Some(1));
    // Both roles are present; the absent Customer carries neutral defaults
    assert_eq!(response.sentiment["Customer"], SentimentResult::neutral());
    assert_eq!(response.tonal["Customer"], TonalResult::neutral_default());
    assert!(response.sentiment.contains_key("Agent"));
}

#[tokio::test]
async fn three_speakers_merge_into_customer() {
    let transcriber = Arc::new(ScriptedTranscriber {
        segments: vec![
            Segment::new(0.0, 1.0, "SPEAKER_00", "Hello, how can I help?"),
            Segment::new(1.0, 2.0, "SPEAKER_01", "I have a question"),
            Segment::new(2.0, 3.0, "SPEAKER_02", "And I am also here"),
            Segment::new(3.0, 4.0, "SPEAKER_01", "Right, as I said"),
        ],
        language: None,
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let response = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap();

    // Speaker count reflects the diarizer's view, roles collapse to two
    assert_eq!(response.num_speakers, Some(3));
    let customer_segments = response
        .segments
        .iter()
        .filter(|s| s.speaker == "Customer")
        .count();
    // Speaker-1's two segments plus speaker-2's one
    assert_eq!(customer_segments, 3);
}

#[tokio::test]
async fn transcription_timeout_is_fatal_and_cleans_up() {
    let transcriber = Arc::new(TimeoutTranscriber {
        seen_path: Mutex::new(None),
    });
    let analyzer = analyzer_with(transcriber.clone(), &Settings::default());

    let err = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::ExternalServiceTimeout { .. }));

    // The transient artifact the transcriber saw is gone
    let seen = transcriber.seen_path.lock().unwrap().clone().unwrap();
    assert!(!seen.exists());
}

#[tokio::test]
async fn scoring_timeout_degrades_one_segment_only() {
    let mut settings = Settings::default();
    settings.external.timeout_ms = 50;
    settings.external.concurrency = 1;

    let transcriber = Arc::new(ScriptedTranscriber {
        segments: vec![
            Segment::new(0.0, 1.0, "SPEAKER_00", "Hello, how can I help?"),
            Segment::new(1.0, 2.0, "SPEAKER_01", "alpha"),
            Segment::new(2.0, 3.0, "SPEAKER_01", "beta"),
            Segment::new(3.0, 4.0, "SPEAKER_01", "gamma slowword"),
            Segment::new(4.0, 5.0, "SPEAKER_01", "delta"),
        ],
        language: None,
    });
    let analyzer = CallAnalyzer::new(
        &settings,
        transcriber,
        Arc::new(KeywordSentiment),
        Arc::new(SlowOnKeywordTonal { keyword: "slowword" }),
    )
    .unwrap();

    let response = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap();

    // Call succeeds; the timed-out segment contributed zeros, pulling the
    // customer mean below the 0.5 the other segments scored
    let customer = &response.tonal["Customer"];
    assert!(customer.neutral < 0.5);
    assert!(customer.neutral > 0.0);
    assert!(customer.in_bounds());
}

#[tokio::test]
async fn silent_call_yields_empty_successful_report() {
    let transcriber = Arc::new(ScriptedTranscriber {
        segments: vec![],
        language: None,
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let response = analyzer
        .analyze(&wav_upload(), SpeakerHints::default())
        .await
        .unwrap();

    assert!(response.segments.is_empty());
    assert!(response.transcription.is_empty());
    assert_eq!(response.num_speakers, Some(0));
    for key in ["Agent", "Customer", "Overall"] {
        assert_eq!(response.tonal[key], TonalResult::neutral_default());
    }
    assert!(response.evaluation.in_bounds());
}

#[tokio::test]
async fn invalid_hints_are_rejected_before_work() {
    let transcriber = Arc::new(ScriptedTranscriber {
        segments: vec![],
        language: None,
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let err = analyzer
        .analyze(&wav_upload(), SpeakerHints { min_speakers: 5, max_speakers: 2 })
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Config(_)));
}

#[tokio::test]
async fn non_wav_upload_is_unsupported() {
    let transcriber = Arc::new(ScriptedTranscriber {
        segments: vec![],
        language: None,
    });
    let analyzer = analyzer_with(transcriber, &Settings::default());

    let err = analyzer
        .analyze(b"\x1aMKV not audio we accept", SpeakerHints::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));
    assert!(err.is_client_error());
}
