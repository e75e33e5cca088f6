use thiserror::Error;

/// Typed failures produced by the analysis pipeline.
///
/// Components only return these; the orchestrator alone decides how each
/// variant maps to the terminal state persisted on the video.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The requested video does not exist in the store. Nothing is written.
    #[error("Video not found")]
    VideoNotFound,

    /// The stored URL does not contain a recognizable platform video id.
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    /// The captioning provider failed or returned no entries. The original
    /// provider detail is carried in the message.
    #[error("Failed to fetch transcript: {0}")]
    TranscriptUnavailable(String),

    /// No inference credential/endpoint is configured. Maps to a soft
    /// success (completed, empty segments, explanatory message).
    #[error("OpenAI API key not configured. Add OPENAI_API_KEY to the environment.")]
    InferenceUnavailable,

    /// A JSON array was located in the model response but failed to parse.
    #[error("Failed to parse exercise list from LLM response: {0}")]
    ExtractionParse(String),

    /// Inference request failed (network, auth, provider error).
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Video store read/write failure.
    #[error("Video store error: {0}")]
    Store(String),

    /// The run exceeded its overall deadline.
    #[error("Analysis timeout after {0} seconds. Video may be too long or transcript unavailable.")]
    Timeout(u64),
}
