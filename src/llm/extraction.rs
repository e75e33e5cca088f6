use tracing::{debug, info, warn};

use super::{create_llm, ChatMessage, LLM, LLMConfig};
use crate::error::AnalysisError;
use crate::store::ExerciseSegment;

const SYSTEM_PROMPT: &str = "You are a fitness expert who analyzes workout videos.";

/// Detects exercises in a formatted transcript via a single LLM call.
pub struct ExerciseExtractor {
    llm: Box<dyn LLM>,
    transcript_char_budget: usize,
}

impl ExerciseExtractor {
    /// Build an extractor from configuration. Fails with
    /// `InferenceUnavailable` when no credential/endpoint is configured.
    pub fn from_config(config: &LLMConfig) -> Result<Self, AnalysisError> {
        Ok(Self {
            llm: create_llm(config)?,
            transcript_char_budget: config.transcript_char_budget,
        })
    }

    /// Build an extractor around an existing LLM instance.
    pub fn new(llm: Box<dyn LLM>, transcript_char_budget: usize) -> Self {
        Self {
            llm,
            transcript_char_budget,
        }
    }

    /// Detect exercises in the formatted transcript.
    ///
    /// A response without any JSON-array-shaped substring is a degraded
    /// success (empty result); an array that fails to parse is a hard
    /// `ExtractionParse` failure.
    pub async fn detect_exercises(
        &self,
        video_title: &str,
        formatted_transcript: &str,
    ) -> Result<Vec<ExerciseSegment>, AnalysisError> {
        let prompt = build_prompt(video_title, formatted_transcript, self.transcript_char_budget);

        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: prompt,
            },
        ];

        debug!("Sending transcript to LLM for exercise detection");
        let response = self.llm.chat(messages).await?;
        debug!("LLM analysis complete (tokens: {:?})", response.tokens_used);

        let raw = response.content.trim();
        let json = match extract_json_array(raw) {
            Some(json) => json,
            None => {
                warn!("No JSON array found in LLM response, treating as no detections");
                return Ok(Vec::new());
            }
        };

        let exercises: Vec<ExerciseSegment> =
            serde_json::from_str(json).map_err(|e| AnalysisError::ExtractionParse(e.to_string()))?;

        info!("✅ Detected {} exercises", exercises.len());
        Ok(exercises)
    }
}

/// Build the instruction prompt embedding the title and the transcript.
///
/// The formatted transcript is cut to the first `char_budget` characters and
/// a literal truncation marker is appended when the original was longer.
pub fn build_prompt(video_title: &str, formatted_transcript: &str, char_budget: usize) -> String {
    let char_count = formatted_transcript.chars().count();
    let (excerpt, marker) = if char_count > char_budget {
        let cut: String = formatted_transcript.chars().take(char_budget).collect();
        (cut, " ...(truncated)")
    } else {
        (formatted_transcript.to_string(), "")
    };

    format!(
        r#"You are analyzing a workout video transcript to identify exercises.

Video Title: {video_title}

Transcript (with timestamps):
{excerpt}{marker}

Extract all exercises mentioned in this workout video. For each exercise:
1. Exercise name (standardized, e.g., "Push-ups", "Squats", "Bench Press")
2. Timestamp in seconds when the exercise starts
3. Target muscle groups (e.g., ["Chest", "Triceps"])

Return ONLY a JSON array in this exact format:
[
  {{
    "exerciseName": "Push-ups",
    "timestamp": 45,
    "targetMuscles": ["Chest", "Triceps", "Shoulders"]
  }}
]

If no exercises are found, return an empty array: []"#
    )
}

/// Locate the first JSON-array-shaped substring in a free-form LLM response.
///
/// Best-effort bracket matching from the first `[` to the last `]`, so prose
/// or markdown fences around the array are tolerated.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMProvider, LLMResponse};
    use async_trait::async_trait;

    struct CannedLLM {
        response: String,
    }

    #[async_trait]
    impl LLM for CannedLLM {
        async fn chat(&self, _messages: Vec<ChatMessage>) -> Result<LLMResponse, AnalysisError> {
            Ok(LLMResponse {
                content: self.response.clone(),
                tokens_used: None,
            })
        }

        fn provider_type(&self) -> LLMProvider {
            LLMProvider::OpenAI
        }
    }

    fn extractor_with(response: &str) -> ExerciseExtractor {
        ExerciseExtractor::new(
            Box::new(CannedLLM {
                response: response.to_string(),
            }),
            3000,
        )
    }

    #[test]
    fn test_extract_json_array_plain() {
        assert_eq!(extract_json_array("[1, 2]"), Some("[1, 2]"));
    }

    #[test]
    fn test_extract_json_array_wrapped_in_prose() {
        let raw = "Here are the exercises:\n[{\"exerciseName\": \"Squats\"}]\nHope that helps!";
        assert_eq!(extract_json_array(raw), Some("[{\"exerciseName\": \"Squats\"}]"));
    }

    #[test]
    fn test_extract_json_array_markdown_fence() {
        let raw = "```json\n[]\n```";
        assert_eq!(extract_json_array(raw), Some("[]"));
    }

    #[test]
    fn test_extract_json_array_none() {
        assert_eq!(extract_json_array("no exercises found"), None);
        assert_eq!(extract_json_array(""), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn test_build_prompt_short_transcript_not_truncated() {
        let prompt = build_prompt("Leg Day", "[0s] squats", 3000);
        assert!(prompt.contains("Video Title: Leg Day"));
        assert!(prompt.contains("[0s] squats"));
        assert!(!prompt.contains("...(truncated)"));
    }

    #[test]
    fn test_build_prompt_truncates_long_transcript() {
        let transcript = "x".repeat(5000);
        let prompt = build_prompt("HIIT", &transcript, 3000);
        assert!(prompt.contains(&"x".repeat(3000)));
        assert!(!prompt.contains(&"x".repeat(3001)));
        assert!(prompt.contains("...(truncated)"));
    }

    #[tokio::test]
    async fn test_detect_parses_segments_in_order() {
        let extractor = extractor_with(
            r#"[
                {"exerciseName": "Push-ups", "timestamp": 45, "targetMuscles": ["Chest", "Triceps"]},
                {"exerciseName": "Squats", "timestamp": 120, "targetMuscles": ["Quads", "Glutes"]}
            ]"#,
        );

        let segments = extractor.detect_exercises("Workout", "[0s] hi").await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].exercise_name, "Push-ups");
        assert_eq!(segments[0].timestamp, 45);
        assert_eq!(segments[1].exercise_name, "Squats");
        assert_eq!(segments[1].timestamp, 120);
    }

    #[tokio::test]
    async fn test_detect_no_array_is_empty_result() {
        let extractor = extractor_with("I could not find any exercises in this transcript.");
        let segments = extractor.detect_exercises("Workout", "[0s] hi").await.unwrap();
        assert!(segments.is_empty());
    }

    #[tokio::test]
    async fn test_detect_malformed_array_is_parse_error() {
        let extractor = extractor_with(r#"[{"exerciseName": "Push-ups", "timestamp": }]"#);
        let err = extractor
            .detect_exercises("Workout", "[0s] hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ExtractionParse(_)));
    }

    #[tokio::test]
    async fn test_detect_missing_muscles_defaults_empty() {
        let extractor = extractor_with(r#"[{"exerciseName": "Plank", "timestamp": 10}]"#);
        let segments = extractor.detect_exercises("Core", "[0s] hi").await.unwrap();
        assert_eq!(segments[0].target_muscles, Vec::<String>::new());
    }
}
