pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;

use crate::config::Settings;
use crate::error::CaptainError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAi,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = CaptainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" | "open_ai" | "gpt" => Ok(Provider::OpenAi),
            other => Err(CaptainError::Configuration(format!(
                "unknown LLM provider: {other} (expected openai or anthropic)"
            ))),
        }
    }
}

/// Caller-chosen sampling configuration for one client.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: u32,
}

/// Prompt in, text out. One call per recommendation, no conversation state.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Builds the client selected by `settings.llm_provider`.
///
/// Fails with [`CaptainError::Configuration`] before any network call when the
/// provider's credential is missing.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn LlmClient>, CaptainError> {
    let client: Arc<dyn LlmClient> = match settings.llm_provider {
        Provider::OpenAi => Arc::new(openai::OpenAiClient::from_settings(settings)?),
        Provider::Anthropic => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    };
    tracing::debug!(provider = %client.provider(), model = client.model(), "LLM client ready");
    Ok(client)
}
