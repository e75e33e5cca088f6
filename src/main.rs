use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod analysis;
mod config;
mod error;
mod llm;
mod store;
mod transcript;
mod youtube;

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::store::{JsonFileStore, Video, VideoStatus, VideoStore};
use crate::youtube::extract_video_id;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("workout_analyzer=info,warn")
        .init();

    let matches = Command::new("Workout Video Analyzer")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Detects exercises in workout videos from their spoken transcript")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("YouTube URL of a workout video to add and analyze"),
        )
        .arg(
            Arg::new("title")
                .short('t')
                .long("title")
                .value_name("TITLE")
                .help("Video title (fetched from the platform when omitted)"),
        )
        .arg(
            Arg::new("video-id")
                .long("video-id")
                .value_name("ID")
                .help("Re-analyze an already stored video by id"),
        )
        .arg(
            Arg::new("store-dir")
                .short('s')
                .long("store-dir")
                .value_name("DIR")
                .help("Directory for stored video documents"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Overall deadline for one analysis run"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(dir) = matches.get_one::<String>("store-dir") {
        config.storage.state_dir = PathBuf::from(dir);
    }
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        config.analysis.timeout_seconds = timeout.parse()?;
    }
    config.validate()?;

    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    info!("🚀 Workout Video Analyzer starting...");
    info!("📂 Store directory: {}", config.storage.state_dir.display());

    let store = Arc::new(JsonFileStore::new(config.storage.state_dir.clone()).await?);
    let analyzer = Analyzer::from_config(&config, store.clone())?;

    let video_id = if let Some(url) = matches.get_one::<String>("url") {
        add_video(store.as_ref(), &config, url, matches.get_one::<String>("title")).await?
    } else if let Some(id) = matches.get_one::<String>("video-id") {
        id.clone()
    } else {
        return Err(anyhow::anyhow!("Provide --url to add a video or --video-id to re-analyze one"));
    };

    // Trigger the run and report the stored terminal state
    analyzer.analyze(&video_id).await?;

    let video = store
        .get(&video_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Video disappeared from store"))?;

    match video.status {
        VideoStatus::Completed => {
            info!("🎉 Analysis completed for '{}'", video.title);
            if let Some(note) = &video.analysis_error {
                warn!("⚠️ {}", note);
            }
            for segment in &video.segments {
                info!(
                    "  [{:>4}s] {} ({})",
                    segment.timestamp,
                    segment.exercise_name,
                    segment.target_muscles.join(", ")
                );
            }
            if video.segments.is_empty() && video.analysis_error.is_none() {
                info!("  No exercises detected");
            }
        }
        VideoStatus::Failed => {
            warn!(
                "❌ Analysis failed: {}",
                video.analysis_error.as_deref().unwrap_or("Unknown error")
            );
        }
        VideoStatus::Pending => {
            warn!("Video is still pending analysis");
        }
    }

    Ok(())
}

/// Insert a video record for the URL, keyed by its platform id. Reuses an
/// existing record so repeated invocations become re-analysis runs.
async fn add_video(
    store: &dyn VideoStore,
    config: &Config,
    url: &str,
    title: Option<&String>,
) -> Result<String> {
    let platform_id =
        extract_video_id(url).ok_or_else(|| anyhow::anyhow!("Invalid YouTube URL: {}", url))?;

    if store.get(&platform_id).await?.is_some() {
        info!("📋 Video {} already stored, re-analyzing", platform_id);
        return Ok(platform_id);
    }

    let title = match title {
        Some(title) => title.clone(),
        None => fetch_video_title(&platform_id, config.transcript.timeout_seconds)
            .await
            .unwrap_or_else(|| {
                warn!("Could not fetch video title, using id");
                platform_id.clone()
            }),
    };

    info!("🆕 Adding video {} ('{}')", platform_id, title);
    store
        .insert(Video::new(platform_id.clone(), url, title))
        .await?;

    Ok(platform_id)
}

/// Fetch the video title via the platform's oembed endpoint.
async fn fetch_video_title(platform_id: &str, timeout_seconds: u64) -> Option<String> {
    let url = format!(
        "https://www.youtube.com/oembed?url=https://www.youtube.com/watch?v={}&format=json",
        platform_id
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .build()
        .ok()?;

    client
        .get(&url)
        .send()
        .await
        .ok()?
        .json::<serde_json::Value>()
        .await
        .ok()?["title"]
        .as_str()
        .map(|s| s.to_string())
}
