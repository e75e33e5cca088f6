/// Workout Video Analyzer
///
/// Analysis pipeline for workout videos: fetches the spoken transcript of a
/// stored video and detects timestamped exercise segments with an LLM,
/// recording the terminal status durably per run.

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod store;
pub mod transcript;
pub mod youtube;

// Re-export main types for easy access
pub use crate::analysis::Analyzer;
pub use crate::config::Config;
pub use crate::error::AnalysisError;
pub use crate::llm::extraction::ExerciseExtractor;
pub use crate::llm::{LLMConfig, LLMProvider};
pub use crate::store::{
    ExerciseSegment, JsonFileStore, MemoryStore, Video, VideoStatus, VideoStore, VideoUpdate,
};
pub use crate::transcript::{TranscriptEntry, TranscriptSource, YoutubeTranscriptFetcher};
pub use crate::youtube::extract_video_id;
