use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::AnalysisError;

/// Analysis status of a stored video.
///
/// Only the orchestrator transitions this field, and only as the single
/// terminal write of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    Pending,
    Completed,
    Failed,
}

/// One detected exercise occurrence within a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSegment {
    /// Standardized exercise label, e.g. "Push-ups"
    pub exercise_name: String,

    /// Seconds from video start
    pub timestamp: u64,

    /// Target muscle groups, may be empty
    #[serde(default)]
    pub target_muscles: Vec<String>,
}

/// A stored video document with its analysis fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub url: String,
    pub title: String,
    pub status: VideoStatus,
    #[serde(default)]
    pub segments: Vec<ExerciseSegment>,
    #[serde(default)]
    pub analysis_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Video {
    /// New video record in the initial `pending` state.
    pub fn new(id: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            status: VideoStatus::Pending,
            segments: Vec::new(),
            analysis_error: None,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of a video's analysis fields.
///
/// Unset fields are left untouched by `VideoStore::update`.
#[derive(Debug, Clone, Default)]
pub struct VideoUpdate {
    pub status: Option<VideoStatus>,
    pub segments: Option<Vec<ExerciseSegment>>,
    /// `Some(None)` clears a previously recorded error.
    pub analysis_error: Option<Option<String>>,
}

impl VideoUpdate {
    pub fn status(mut self, status: VideoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn segments(mut self, segments: Vec<ExerciseSegment>) -> Self {
        self.segments = Some(segments);
        self
    }

    pub fn analysis_error(mut self, error: Option<String>) -> Self {
        self.analysis_error = Some(error);
        self
    }

    fn apply(&self, video: &mut Video) {
        if let Some(status) = self.status {
            video.status = status;
        }
        if let Some(ref segments) = self.segments {
            video.segments = segments.clone();
        }
        if let Some(ref error) = self.analysis_error {
            video.analysis_error = error.clone();
        }
    }
}

/// Durable key-value persistence of video documents.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Video>, AnalysisError>;
    async fn insert(&self, video: Video) -> Result<(), AnalysisError>;
    async fn update(&self, id: &str, update: VideoUpdate) -> Result<(), AnalysisError>;
}

/// File-backed video store: one JSON document per video in a state directory,
/// with an in-memory cache loaded at startup.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    state_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, Video>>>,
}

impl JsonFileStore {
    /// Create a store rooted at `state_dir`, loading any existing documents.
    pub async fn new(state_dir: PathBuf) -> Result<Self, AnalysisError> {
        fs::create_dir_all(&state_dir)
            .await
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let store = Self {
            state_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        };
        store.load_existing().await?;

        let cached = store.cache.read().await.len();
        info!("📊 Video store initialized with {} cached videos", cached);

        Ok(store)
    }

    async fn load_existing(&self) -> Result<(), AnalysisError> {
        let mut entries = fs::read_dir(&self.state_dir)
            .await
            .map_err(|e| AnalysisError::Store(e.to_string()))?;
        let mut loaded = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AnalysisError::Store(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                match fs::read_to_string(&path).await {
                    Ok(content) => match serde_json::from_str::<Video>(&content) {
                        Ok(video) => {
                            self.cache.write().await.insert(video.id.clone(), video);
                            loaded += 1;
                        }
                        Err(e) => warn!("Skipping invalid video file {}: {}", path.display(), e),
                    },
                    Err(e) => warn!("Failed to read video file {}: {}", path.display(), e),
                }
            }
        }

        debug!("📁 Loaded {} video documents from disk", loaded);
        Ok(())
    }

    fn document_path(&self, id: &str) -> PathBuf {
        // ids are opaque; sanitize anything path-hostile
        let safe: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.state_dir.join(format!("{}.json", safe))
    }

    async fn persist(&self, video: &Video) -> Result<(), AnalysisError> {
        let path = self.document_path(&video.id);
        let json = serde_json::to_string_pretty(video)
            .map_err(|e| AnalysisError::Store(e.to_string()))?;
        fs::write(&path, json)
            .await
            .map_err(|e| AnalysisError::Store(e.to_string()))?;
        debug!("💾 Persisted video {}", video.id);
        Ok(())
    }
}

#[async_trait]
impl VideoStore for JsonFileStore {
    async fn get(&self, id: &str) -> Result<Option<Video>, AnalysisError> {
        Ok(self.cache.read().await.get(id).cloned())
    }

    async fn insert(&self, video: Video) -> Result<(), AnalysisError> {
        self.persist(&video).await?;
        self.cache.write().await.insert(video.id.clone(), video);
        Ok(())
    }

    async fn update(&self, id: &str, update: VideoUpdate) -> Result<(), AnalysisError> {
        let mut cache = self.cache.write().await;
        let video = cache.get_mut(id).ok_or(AnalysisError::VideoNotFound)?;
        update.apply(video);
        let snapshot = video.clone();
        drop(cache);

        self.persist(&snapshot).await
    }
}

/// In-memory video store, used by tests and embedders that bring their own
/// persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    videos: Arc<RwLock<HashMap<String, Video>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Video>, AnalysisError> {
        Ok(self.videos.read().await.get(id).cloned())
    }

    async fn insert(&self, video: Video) -> Result<(), AnalysisError> {
        self.videos.write().await.insert(video.id.clone(), video);
        Ok(())
    }

    async fn update(&self, id: &str, update: VideoUpdate) -> Result<(), AnalysisError> {
        let mut videos = self.videos.write().await;
        let video = videos.get_mut(id).ok_or(AnalysisError::VideoNotFound)?;
        update.apply(video);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_insert_and_get() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().to_path_buf()).await.unwrap();

        let video = Video::new("abc123", "https://youtu.be/dQw4w9WgXcQ", "Full Body Workout");
        store.insert(video).await.unwrap();

        let loaded = store.get("abc123").await.unwrap().unwrap();
        assert_eq!(loaded.title, "Full Body Workout");
        assert_eq!(loaded.status, VideoStatus::Pending);
        assert!(loaded.segments.is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::new(temp.path().to_path_buf()).await.unwrap();

        let mut video = Video::new("abc123", "https://youtu.be/dQw4w9WgXcQ", "Leg Day");
        video.analysis_error = Some("previous error".to_string());
        store.insert(video).await.unwrap();

        store
            .update("abc123", VideoUpdate::default().status(VideoStatus::Completed))
            .await
            .unwrap();

        let loaded = store.get("abc123").await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Completed);
        assert_eq!(loaded.analysis_error, Some("previous error".to_string()));
        assert_eq!(loaded.title, "Leg Day");
    }

    #[tokio::test]
    async fn test_update_clears_error() {
        let store = MemoryStore::new();
        let mut video = Video::new("v1", "https://youtu.be/dQw4w9WgXcQ", "Core");
        video.analysis_error = Some("stale".to_string());
        store.insert(video).await.unwrap();

        store
            .update("v1", VideoUpdate::default().analysis_error(None))
            .await
            .unwrap();

        let loaded = store.get("v1").await.unwrap().unwrap();
        assert_eq!(loaded.analysis_error, None);
    }

    #[tokio::test]
    async fn test_update_missing_video() {
        let store = MemoryStore::new();
        let err = store
            .update("missing", VideoUpdate::default().status(VideoStatus::Failed))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::VideoNotFound));
    }

    #[tokio::test]
    async fn test_reload_from_disk() {
        let temp = TempDir::new().unwrap();
        {
            let store = JsonFileStore::new(temp.path().to_path_buf()).await.unwrap();
            let video = Video::new("abc123", "https://youtu.be/dQw4w9WgXcQ", "HIIT Session");
            store.insert(video).await.unwrap();
            store
                .update(
                    "abc123",
                    VideoUpdate::default()
                        .status(VideoStatus::Completed)
                        .segments(vec![ExerciseSegment {
                            exercise_name: "Burpees".to_string(),
                            timestamp: 30,
                            target_muscles: vec!["Full Body".to_string()],
                        }]),
                )
                .await
                .unwrap();
        }

        let reopened = JsonFileStore::new(temp.path().to_path_buf()).await.unwrap();
        let loaded = reopened.get("abc123").await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Completed);
        assert_eq!(loaded.segments.len(), 1);
        assert_eq!(loaded.segments[0].exercise_name, "Burpees");
    }

    #[test]
    fn test_segment_json_shape() {
        let segment = ExerciseSegment {
            exercise_name: "Push-ups".to_string(),
            timestamp: 45,
            target_muscles: vec!["Chest".to_string(), "Triceps".to_string()],
        };
        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["exerciseName"], "Push-ups");
        assert_eq!(json["timestamp"], 45);
        assert_eq!(json["targetMuscles"][0], "Chest");
    }
}
