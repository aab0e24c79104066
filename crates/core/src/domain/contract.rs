use crate::domain::recommendation::{
    CaptainRecommendation, DifferentialPotential, RecommendationSet, RiskLevel,
    RECOMMENDATION_COUNT,
};
use anyhow::{bail, ensure};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// The reply shape the prompt asks the model for, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCaptainResponse {
    pub recommendations: Vec<LlmCaptainItem>,
    #[serde(default)]
    pub general_advice: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCaptainItem {
    pub rank: i64,
    pub player_name: String,
    #[serde(default)]
    pub player_id: Option<i64>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
    pub risk_level: String,
    pub differential_potential: String,
}

impl LlmCaptainResponse {
    pub fn validate_and_into_set(self) -> anyhow::Result<RecommendationSet> {
        ensure!(
            self.recommendations.len() == RECOMMENDATION_COUNT,
            "LLM output must contain exactly {RECOMMENDATION_COUNT} recommendations (got {})",
            self.recommendations.len()
        );

        let mut seen_ranks = BTreeSet::<i64>::new();
        let mut recommendations = Vec::with_capacity(self.recommendations.len());
        for item in self.recommendations {
            recommendations.push(item.validate_and_into_recommendation(&mut seen_ranks)?);
        }
        recommendations.sort_by_key(|r| r.rank);

        let general_advice = self
            .general_advice
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        Ok(RecommendationSet {
            recommendations,
            general_advice,
        })
    }
}

impl LlmCaptainItem {
    fn validate_and_into_recommendation(
        self,
        seen_ranks: &mut BTreeSet<i64>,
    ) -> anyhow::Result<CaptainRecommendation> {
        let max_rank = RECOMMENDATION_COUNT as i64;
        ensure!(
            (1..=max_rank).contains(&self.rank),
            "rank out of range: {}",
            self.rank
        );
        ensure!(seen_ranks.insert(self.rank), "duplicate rank: {}", self.rank);

        let player_name = self.player_name.trim().to_string();
        ensure!(!player_name.is_empty(), "player_name must be non-empty");

        let player_id = match self.player_id {
            None => None,
            Some(id) => match u32::try_from(id) {
                Ok(id) => Some(id),
                Err(_) => bail!("player_id out of range: {id}"),
            },
        };

        let key_factors = self
            .key_factors
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(CaptainRecommendation {
            rank: self.rank as u8,
            player_name,
            player_id,
            reasoning: self.reasoning.trim().to_string(),
            key_factors,
            risk_level: parse_risk_level(&self.risk_level)?,
            differential_potential: parse_differential(&self.differential_potential)?,
        })
    }
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_risk_level(s: &str) -> anyhow::Result<RiskLevel> {
    match normalize_label(s).as_str() {
        "low" => Ok(RiskLevel::Low),
        "medium" => Ok(RiskLevel::Medium),
        "high" => Ok(RiskLevel::High),
        _ => bail!("unknown risk_level: {s:?}"),
    }
}

fn parse_differential(s: &str) -> anyhow::Result<DifferentialPotential> {
    match normalize_label(s).as_str() {
        "template" => Ok(DifferentialPotential::Template),
        "semi differential" => Ok(DifferentialPotential::SemiDifferential),
        "high differential" => Ok(DifferentialPotential::HighDifferential),
        _ => bail!("unknown differential_potential: {s:?}"),
    }
}
