use thiserror::Error;

/// Errors raised by the configuration and sports-data layers.
///
/// Model-call failures travel as `anyhow::Error` wrapping
/// [`crate::llm::error::LlmDiagnosticsError`]; an unparseable model reply is not
/// an error at all but a [`crate::domain::recommendation::RecommendationOutcome`].
#[derive(Debug, Error)]
pub enum CaptainError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("upstream unavailable ({endpoint}): {detail}")]
    UpstreamUnavailable { endpoint: String, detail: String },

    #[error("unexpected payload from {endpoint}: {detail}")]
    UnexpectedPayload { endpoint: String, detail: String },
}

impl CaptainError {
    pub fn upstream(endpoint: &str, detail: impl std::fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            endpoint: endpoint.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn payload(endpoint: &str, detail: impl std::fmt::Display) -> Self {
        Self::UnexpectedPayload {
            endpoint: endpoint.to_string(),
            detail: detail.to_string(),
        }
    }
}
