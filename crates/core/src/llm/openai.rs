use crate::config::Settings;
use crate::error::CaptainError;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{LlmClient, LlmOptions, Provider};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat Completions client sending a single user message per call.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    options: LlmOptions,
}

impl OpenAiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, CaptainError> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url = settings
            .openai_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let options = LlmOptions {
            model: settings
                .llm_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: settings.llm_temperature,
            max_tokens: settings.llm_max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        };
        let timeout_secs = settings.llm_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(CaptainError::HttpClient)?;

        Ok(Self {
            http,
            api_key,
            base_url,
            options,
        })
    }

    fn request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.options.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.options.temperature,
            max_completion_tokens: self.options.max_tokens,
        }
    }

    fn reply_text(res: &ChatCompletionResponse) -> Option<&str> {
        res.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model(&self) -> &str {
        &self.options.model
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read OpenAI response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::OpenAi,
                model: self.options.model.clone(),
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let parsed = serde_json::from_str::<ChatCompletionResponse>(&text)
            .with_context(|| format!("failed to decode OpenAI response: {text}"))?;

        if let Some(reason) = parsed.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason == "length" {
                tracing::warn!(
                    max_tokens = self.options.max_tokens,
                    "OpenAI finish_reason=length; reply may be truncated"
                );
            }
        }

        match Self::reply_text(&parsed) {
            Some(reply) => Ok(reply.to_string()),
            None => Err(LlmDiagnosticsError {
                provider: Provider::OpenAi,
                model: self.options.model.clone(),
                stage: "empty_reply",
                detail: "response contained no message content".to_string(),
                raw_output: None,
                raw_response_json: serde_json::from_str(&text).ok(),
            }
            .into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_first_choice_content() {
        let res: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"a\": 1}"}, "finish_reason": "stop"}
            ]
        }))
        .unwrap();
        assert_eq!(OpenAiClient::reply_text(&res), Some("{\"a\": 1}"));
    }

    #[test]
    fn null_or_blank_content_is_no_reply() {
        let res: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(OpenAiClient::reply_text(&res), None);

        let empty: ChatCompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(OpenAiClient::reply_text(&empty), None);
    }

    #[test]
    fn temperature_is_omitted_when_unset() {
        let settings = Settings {
            openai_api_key: Some("sk-test".to_string()),
            llm_temperature: None,
            ..Settings::default()
        };
        let client = OpenAiClient::from_settings(&settings).unwrap();
        let body = serde_json::to_value(client.request("hi")).unwrap();
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }
}
