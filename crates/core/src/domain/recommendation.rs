use serde::{Deserialize, Serialize};

pub const RECOMMENDATION_COUNT: usize = 3;
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse LLM response";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferentialPotential {
    Template,
    #[serde(rename = "Semi-differential")]
    SemiDifferential,
    #[serde(rename = "High differential")]
    HighDifferential,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl DifferentialPotential {
    pub fn label(self) -> &'static str {
        match self {
            Self::Template => "Template",
            Self::SemiDifferential => "Semi-differential",
            Self::HighDifferential => "High differential",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptainRecommendation {
    pub rank: u8,
    pub player_name: String,
    pub player_id: Option<u32>,
    pub reasoning: String,
    pub key_factors: Vec<String>,
    pub risk_level: RiskLevel,
    pub differential_potential: DifferentialPotential,
}

/// Three captain picks ranked 1..=3, plus the model's general advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<CaptainRecommendation>,
    pub general_advice: String,
}

/// Result of one recommendation cycle.
///
/// Serializes untagged so each variant has exactly the JSON shape consumers
/// export: the recommendation set itself, `{error, raw_response}` when the
/// model reply could not be used, or `{error, team_id}` when the flow failed
/// before a reply was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecommendationOutcome {
    Recommended(RecommendationSet),
    Unparseable { error: String, raw_response: String },
    Failed { error: String, team_id: u64 },
}

impl RecommendationOutcome {
    pub fn unparseable(raw_response: impl Into<String>) -> Self {
        Self::Unparseable {
            error: PARSE_FAILURE_MESSAGE.to_string(),
            raw_response: raw_response.into(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Recommended(_) => None,
            Self::Unparseable { error, .. } | Self::Failed { error, .. } => Some(error),
        }
    }

    pub fn recommendation_set(&self) -> Option<&RecommendationSet> {
        match self {
            Self::Recommended(set) => Some(set),
            _ => None,
        }
    }
}
