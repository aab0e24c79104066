use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// A failed model call, kept with whatever the provider sent back.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub model: String,
    /// `http` for non-2xx replies, `empty_reply` when no text came back.
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} call to model {} failed at {}: {}",
            self.provider, self.model, self.stage, self.detail
        )
    }
}

impl std::error::Error for LlmDiagnosticsError {}
