use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::LLMConfig;

/// Configuration for the workout video analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Exercise-detection LLM settings
    pub llm: LLMConfig,

    /// Transcript provider settings
    pub transcript: TranscriptConfig,

    /// Per-run analysis settings
    pub analysis: AnalysisConfig,

    /// Video store settings
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Caption language requested from the provider
    pub language: String,

    /// Timeout for transcript requests (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Overall deadline for one analysis run (seconds)
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON document per video
    pub state_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            transcript: TranscriptConfig {
                language: "en".to_string(),
                timeout_seconds: 15,
            },
            analysis: AnalysisConfig { timeout_seconds: 60 },
            storage: StorageConfig {
                state_dir: PathBuf::from("./videos"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to environment variables.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "workout-analyzer.toml",
            "config/workout-analyzer.toml",
            "~/.config/workout-analyzer/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::from_env())
    }

    /// Build configuration from defaults plus environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            if !api_key.is_empty() {
                self.llm.api_key = Some(api_key);
            }
        }

        if let Ok(endpoint) = std::env::var("WORKOUT_ANALYZER_LLM_ENDPOINT") {
            self.llm.endpoint = Some(endpoint);
        }

        if let Ok(model) = std::env::var("WORKOUT_ANALYZER_MODEL") {
            self.llm.model = model;
        }

        if let Ok(timeout) = std::env::var("WORKOUT_ANALYZER_TIMEOUT") {
            self.analysis.timeout_seconds = timeout.parse().unwrap_or(60);
        }

        if let Ok(state_dir) = std::env::var("WORKOUT_ANALYZER_STATE_DIR") {
            self.storage.state_dir = PathBuf::from(state_dir);
        }

        if let Ok(language) = std::env::var("WORKOUT_ANALYZER_LANGUAGE") {
            self.transcript.language = language;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.timeout_seconds == 0 {
            return Err(anyhow!("analysis.timeout_seconds must be greater than 0"));
        }

        if self.llm.max_tokens == 0 {
            return Err(anyhow!("llm.max_tokens must be greater than 0"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("llm.temperature must be between 0.0 and 2.0"));
        }

        if self.transcript.language.is_empty() {
            return Err(anyhow!("transcript.language must not be empty"));
        }

        Ok(())
    }
}
