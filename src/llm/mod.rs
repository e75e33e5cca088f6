pub mod extraction;
pub mod providers;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// LLM provider types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LLMProvider {
    OpenAI,
    LMStudio,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub provider: LLMProvider,

    /// API endpoint (for LMStudio and custom providers)
    pub endpoint: Option<String>,

    /// API key (for cloud providers)
    pub api_key: Option<String>,

    /// Model to use
    pub model: String,

    /// Output-token budget, caps cost and latency per request
    pub max_tokens: u32,

    /// Low temperature favors deterministic extraction
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum number of formatted-transcript characters embedded in the prompt
    pub transcript_char_budget: usize,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::OpenAI,
            endpoint: None,
            api_key: None,
            model: "gpt-4.1-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            timeout_seconds: 30,
            transcript_char_budget: 3000,
        }
    }
}

impl LLMConfig {
    /// Capability check: whether the configured provider can be invoked at
    /// all. Checked once at orchestrator construction, never mid-run.
    pub fn is_configured(&self) -> bool {
        match self.provider {
            LLMProvider::OpenAI => self.api_key.is_some(),
            LLMProvider::LMStudio => self.endpoint.is_some(),
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLM: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse, AnalysisError>;
    fn provider_type(&self) -> LLMProvider;
}

/// Create LLM instance based on configuration.
///
/// Fails with `InferenceUnavailable` when the provider has no credentials or
/// endpoint configured, so the caller can record a user-actionable message
/// instead of a generic failure.
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>, AnalysisError> {
    if !config.is_configured() {
        return Err(AnalysisError::InferenceUnavailable);
    }

    match config.provider {
        LLMProvider::OpenAI => Ok(Box::new(providers::OpenAIProvider::new(config.clone())?)),
        LLMProvider::LMStudio => Ok(Box::new(providers::LMStudioProvider::new(config.clone())?)),
    }
}
