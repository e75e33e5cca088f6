use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranscriptConfig;
use crate::error::AnalysisError;

/// One timestamped caption line. Pipeline-internal, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    /// Offset from video start in milliseconds
    pub offset_ms: u64,
    /// Caption text
    pub text: String,
}

/// Source of timestamped captions for a platform video id.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, AnalysisError>;
}

/// Fetches captions from YouTube's timedtext endpoint (JSON3 format).
pub struct YoutubeTranscriptFetcher {
    client: reqwest::Client,
    language: String,
}

impl YoutubeTranscriptFetcher {
    pub fn new(config: &TranscriptConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AnalysisError::TranscriptUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptFetcher {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptEntry>, AnalysisError> {
        let url = format!(
            "https://www.youtube.com/api/timedtext?v={}&lang={}&fmt=json3",
            video_id, self.language
        );

        debug!("Fetching transcript for video {}", video_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AnalysisError::TranscriptUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AnalysisError::TranscriptUnavailable(format!(
                "transcript request returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::TranscriptUnavailable(e.to_string()))?;

        let entries = parse_timedtext(&body)?;

        info!(
            "✅ Fetched transcript for video {}: {} segments",
            video_id,
            entries.len()
        );
        Ok(entries)
    }
}

/// Parse the JSON3 timedtext body into transcript entries.
///
/// A video without captions yields an empty or non-JSON body; both surface as
/// `TranscriptUnavailable`, matching the provider-failure case. The pipeline
/// does not distinguish "no captions" from "provider call failed".
pub fn parse_timedtext(body: &str) -> Result<Vec<TranscriptEntry>, AnalysisError> {
    let value: Value = serde_json::from_str(body).map_err(|_| {
        AnalysisError::TranscriptUnavailable("No transcript available for this video".to_string())
    })?;

    let mut entries = Vec::new();

    if let Some(events) = value["events"].as_array() {
        for event in events {
            let offset_ms = match event["tStartMs"].as_u64() {
                Some(ms) => ms,
                None => continue,
            };

            let text = event["segs"]
                .as_array()
                .map(|segs| {
                    segs.iter()
                        .filter_map(|seg| seg["utf8"].as_str())
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();

            let text = text.replace('\n', " ").trim().to_string();
            if !text.is_empty() {
                entries.push(TranscriptEntry { offset_ms, text });
            }
        }
    }

    if entries.is_empty() {
        return Err(AnalysisError::TranscriptUnavailable(
            "No transcript available for this video".to_string(),
        ));
    }

    Ok(entries)
}

/// Render transcript entries as a single time-annotated text block.
///
/// One line per entry, `[<seconds>s] <text>`, input order preserved. No
/// truncation happens here; the prompt budget is applied by the extractor.
pub fn format_transcript(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("[{}s] {}", entry.offset_ms / 1000, entry.text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset_ms: u64, text: &str) -> TranscriptEntry {
        TranscriptEntry {
            offset_ms,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_format_one_line_per_entry() {
        let entries = vec![
            entry(0, "welcome to the workout"),
            entry(1500, "first up push-ups"),
            entry(62000, "now squats"),
        ];

        let formatted = format_transcript(&entries);
        let lines: Vec<&str> = formatted.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[0s] welcome to the workout");
        assert_eq!(lines[1], "[1s] first up push-ups");
        assert_eq!(lines[2], "[62s] now squats");
    }

    #[test]
    fn test_format_preserves_input_order() {
        let entries = vec![entry(30000, "later"), entry(1000, "earlier")];
        let formatted = format_transcript(&entries);
        assert_eq!(formatted, "[30s] later\n[1s] earlier");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_parse_timedtext_json3() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 2000, "segs": [{"utf8": "hello "}, {"utf8": "there"}]},
                {"tStartMs": 2500, "segs": [{"utf8": "push-ups\n"}]},
                {"tStartMs": 4000, "segs": [{"utf8": "  "}]}
            ]
        }"#;

        let entries = parse_timedtext(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], TranscriptEntry { offset_ms: 0, text: "hello there".to_string() });
        assert_eq!(entries[1], TranscriptEntry { offset_ms: 2500, text: "push-ups".to_string() });
    }

    #[test]
    fn test_parse_timedtext_empty_body_is_unavailable() {
        let err = parse_timedtext("").unwrap_err();
        assert!(matches!(err, AnalysisError::TranscriptUnavailable(_)));
    }

    #[test]
    fn test_parse_timedtext_no_events_is_unavailable() {
        let err = parse_timedtext(r#"{"events": []}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::TranscriptUnavailable(_)));
    }
}
