use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AnalysisError;
use crate::llm::extraction::ExerciseExtractor;
use crate::store::{ExerciseSegment, VideoStatus, VideoStore, VideoUpdate};
use crate::transcript::{format_transcript, TranscriptSource, YoutubeTranscriptFetcher};
use crate::youtube::extract_video_id;

/// Result of one pipeline pass, before any store write.
enum PipelineOutcome {
    /// Inference ran; segments in the extractor's (ascending) order.
    Detected(Vec<ExerciseSegment>),
    /// No inference credentials configured; soft success.
    InferenceSkipped,
}

/// Sequences one analysis run per video: store lookup, id extraction,
/// transcript fetch, formatting and LLM extraction, under a single deadline.
///
/// The pipeline itself never writes to the store. All terminal writes happen
/// here after the deadline race resolves, so each run produces exactly one
/// terminal write. On timeout the in-flight pipeline future is dropped, which
/// makes a late overwrite impossible.
pub struct Analyzer {
    store: Arc<dyn VideoStore>,
    transcript_source: Arc<dyn TranscriptSource>,
    extractor: Option<ExerciseExtractor>,
    deadline: Duration,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn VideoStore>,
        transcript_source: Arc<dyn TranscriptSource>,
        extractor: Option<ExerciseExtractor>,
        deadline: Duration,
    ) -> Self {
        Self {
            store,
            transcript_source,
            extractor,
            deadline,
        }
    }

    /// Wire up an analyzer from configuration. Inference availability is
    /// resolved here, once, as a capability rather than checked mid-run.
    pub fn from_config(config: &Config, store: Arc<dyn VideoStore>) -> Result<Self, AnalysisError> {
        let fetcher = YoutubeTranscriptFetcher::new(&config.transcript)?;

        let extractor = if config.llm.is_configured() {
            Some(ExerciseExtractor::from_config(&config.llm)?)
        } else {
            warn!("⚠️ No inference credentials configured, analysis will skip exercise detection");
            None
        };

        Ok(Self::new(
            store,
            Arc::new(fetcher),
            extractor,
            Duration::from_secs(config.analysis.timeout_seconds),
        ))
    }

    /// Run one analysis for the given stored video id.
    ///
    /// Returns the terminal status that was written, or an error when the
    /// video does not exist (nothing written) or the store itself failed.
    pub async fn analyze(&self, video_id: &str) -> Result<VideoStatus, AnalysisError> {
        info!("🚀 Starting analysis for video {}", video_id);

        let raced = tokio::time::timeout(self.deadline, self.run_pipeline(video_id)).await;

        match raced {
            Err(_elapsed) => {
                let err = AnalysisError::Timeout(self.deadline.as_secs());
                warn!("⏰ Analysis timed out for video {}", video_id);
                self.record_failure(video_id, &err).await?;
                Ok(VideoStatus::Failed)
            }
            Ok(Err(AnalysisError::VideoNotFound)) => {
                // Precondition failure: nothing to write to.
                Err(AnalysisError::VideoNotFound)
            }
            Ok(Err(err @ AnalysisError::Store(_))) => Err(err),
            Ok(Err(err)) => {
                warn!("❌ Analysis failed for video {}: {}", video_id, err);
                self.record_failure(video_id, &err).await?;
                Ok(VideoStatus::Failed)
            }
            Ok(Ok(PipelineOutcome::Detected(segments))) => {
                info!(
                    "🎉 Analysis complete for video {}: {} exercises",
                    video_id,
                    segments.len()
                );
                self.store
                    .update(
                        video_id,
                        VideoUpdate::default()
                            .status(VideoStatus::Completed)
                            .segments(segments)
                            .analysis_error(None),
                    )
                    .await?;
                Ok(VideoStatus::Completed)
            }
            Ok(Ok(PipelineOutcome::InferenceSkipped)) => {
                info!(
                    "✅ Analysis stored without detections for video {} (inference unavailable)",
                    video_id
                );
                self.store
                    .update(
                        video_id,
                        VideoUpdate::default()
                            .status(VideoStatus::Completed)
                            .segments(Vec::new())
                            .analysis_error(Some(AnalysisError::InferenceUnavailable.to_string())),
                    )
                    .await?;
                Ok(VideoStatus::Completed)
            }
        }
    }

    /// Steps 1-6 of a run. Returns outcomes and typed errors only; writing
    /// the terminal state is the caller's job.
    async fn run_pipeline(&self, video_id: &str) -> Result<PipelineOutcome, AnalysisError> {
        let video = self
            .store
            .get(video_id)
            .await?
            .ok_or(AnalysisError::VideoNotFound)?;

        let platform_id = extract_video_id(&video.url).ok_or(AnalysisError::InvalidUrl)?;

        let entries = self.transcript_source.fetch(&platform_id).await?;
        let formatted = format_transcript(&entries);

        let extractor = match &self.extractor {
            Some(extractor) => extractor,
            None => return Ok(PipelineOutcome::InferenceSkipped),
        };

        let segments = extractor.detect_exercises(&video.title, &formatted).await?;
        Ok(PipelineOutcome::Detected(segments))
    }

    async fn record_failure(&self, video_id: &str, err: &AnalysisError) -> Result<(), AnalysisError> {
        self.store
            .update(
                video_id,
                VideoUpdate::default()
                    .status(VideoStatus::Failed)
                    .segments(Vec::new())
                    .analysis_error(Some(err.to_string())),
            )
            .await
    }
}
