//! Pipeline orchestrator
//!
//! One call's stages run in strict sequence (normalize, transcribe,
//! resolve roles, aggregate, score, evaluate, assemble) because each stage
//! consumes the prior stage's complete output. Pipeline instances hold no
//! cross-request state; independent calls run in parallel subject to the
//! server's admission limit.

use crate::aggregate::SegmentAggregator;
use crate::assemble::ResponseAssembler;
use crate::clients::{HttpSentimentScorer, HttpTonalScorer, HttpTranscriber};
use crate::evaluation::EvaluationEngine;
use crate::normalize::AudioNormalizer;
use crate::roles::SpeakerRoleResolver;
use crate::scoring::SentimentTonalScorer;
use call_qa_core::{
    AnalysisResponse, Result, SentimentScorer, SpeakerHints, TonalScorer, Transcriber,
};
use call_qa_config::Settings;
use std::sync::Arc;

/// End-to-end call analysis
pub struct CallAnalyzer {
    normalizer: AudioNormalizer,
    transcriber: Arc<dyn Transcriber>,
    resolver: SpeakerRoleResolver,
    aggregator: SegmentAggregator,
    scorer: SentimentTonalScorer,
    engine: EvaluationEngine,
    assembler: ResponseAssembler,
}

impl CallAnalyzer {
    /// Build an analyzer over explicit capability implementations.
    /// Tests inject mocks through this constructor.
    pub fn new(
        settings: &Settings,
        transcriber: Arc<dyn Transcriber>,
        sentiment: Arc<dyn SentimentScorer>,
        tonal: Arc<dyn TonalScorer>,
    ) -> Result<Self> {
        Ok(Self {
            normalizer: AudioNormalizer::new(settings.audio.target_sample_rate),
            transcriber,
            resolver: SpeakerRoleResolver::from_labels(&settings.speakers.role_overrides)?,
            aggregator: SegmentAggregator,
            scorer: SentimentTonalScorer::new(
                sentiment,
                tonal,
                settings.external.concurrency,
                settings.external.timeout_ms,
            ),
            engine: EvaluationEngine::new(settings.evaluation.clone()),
            assembler: ResponseAssembler::new(&settings.evaluation),
        })
    }

    /// Build an analyzer wired to the configured HTTP capabilities
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transcriber = Arc::new(HttpTranscriber::new(&settings.external)?);
        let sentiment = Arc::new(HttpSentimentScorer::new(&settings.external)?);
        let tonal = Arc::new(HttpTonalScorer::new(&settings.external)?);
        Self::new(settings, transcriber, sentiment, tonal)
    }

    /// Analyze one uploaded recording.
    ///
    /// The normalized artifact lives on this stack frame, so it is removed
    /// on every exit path: success, upstream failure, or invariant
    /// violation in a later stage.
    pub async fn analyze(&self, bytes: &[u8], hints: SpeakerHints) -> Result<AnalysisResponse> {
        hints.validate()?;

        let artifact = self.normalizer.normalize(bytes)?;
        tracing::debug!(
            duration_secs = artifact.duration_secs,
            sample_rate = artifact.sample_rate,
            "Audio normalized"
        );

        let transcription = self
            .transcriber
            .transcribe(artifact.path(), &hints)
            .await?;
        // The artifact is only consumed by transcription; release it before
        // the scoring fan-out starts
        drop(artifact);

        let assignment = self.resolver.resolve(&transcription.segments)?;
        let aggregated = self.aggregator.aggregate(&transcription.segments, &assignment)?;
        let scored = self.scorer.score(&aggregated).await;
        let evaluation = self.engine.evaluate(&aggregated, &scored);

        let response = self.assembler.assemble(
            &aggregated,
            &scored,
            evaluation,
            transcription.language,
            assignment.num_speakers,
        )?;

        tracing::info!(
            segments = response.segments.len(),
            num_speakers = assignment.num_speakers,
            final_rating = response.evaluation.final_rating,
            verdict = %response.evaluation.evaluation,
            "Call analysis complete"
        );

        Ok(response)
    }
}
