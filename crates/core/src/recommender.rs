use crate::domain::contract::LlmCaptainResponse;
use crate::domain::player::{Fixture, FixtureRow, SquadOverview, TeamSnapshot};
use crate::domain::recommendation::RecommendationOutcome;
use crate::error::CaptainError;
use crate::fpl::types::BootstrapStatic;
use crate::fpl::{mapper, FplClient};
use crate::llm::{json, LlmClient};
use crate::prompt::PromptContext;
use anyhow::Context;
use std::sync::Arc;

/// Everything fetched for one team in one session.
#[derive(Debug, Clone)]
pub struct TeamData {
    pub catalog: Arc<BootstrapStatic>,
    pub snapshot: TeamSnapshot,
    pub fixtures: Vec<Fixture>,
    pub window_size: u32,
}

impl TeamData {
    pub fn team_id(&self) -> u64 {
        self.snapshot.team_id
    }

    pub fn squad_overview(&self) -> SquadOverview {
        mapper::squad_overview(&self.catalog, &self.snapshot)
    }

    pub fn fixture_rows(&self) -> Vec<FixtureRow> {
        mapper::fixture_rows(&self.catalog, &self.fixtures)
    }

    pub fn prompt_context(&self) -> PromptContext {
        PromptContext::build(&self.catalog, &self.snapshot, &self.fixtures, self.window_size)
    }
}

/// One recommendation session: a caching sports-data client plus a model.
///
/// Build a fresh recommender per session; its caches are never refreshed.
pub struct CaptainRecommender {
    fpl: FplClient,
    llm: Arc<dyn LlmClient>,
    window_size: u32,
}

impl std::fmt::Debug for CaptainRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptainRecommender")
            .field("fpl", &self.fpl)
            .field("provider", &self.llm.provider())
            .field("model", &self.llm.model())
            .field("window_size", &self.window_size)
            .finish()
    }
}

impl CaptainRecommender {
    pub fn new(fpl: FplClient, llm: Arc<dyn LlmClient>, window_size: u32) -> Self {
        Self {
            fpl,
            llm,
            window_size,
        }
    }

    /// Fetches the team, the catalog and the fixture window once.
    pub async fn load_team(&self, team_id: u64) -> Result<TeamData, CaptainError> {
        let snapshot = self.fpl.fetch_team_snapshot(team_id).await?;
        let catalog = self.fpl.fetch_catalog().await?;
        let fixtures = self.fpl.fetch_fixtures(self.window_size).await?;

        tracing::info!(
            team_id,
            gameweek = snapshot.gameweek,
            squad = snapshot.picks.len(),
            fixtures = fixtures.len(),
            "loaded team data"
        );
        Ok(TeamData {
            catalog,
            snapshot,
            fixtures,
            window_size: self.window_size,
        })
    }

    /// Runs the whole fetch, prompt, model and parse sequence.
    ///
    /// Never fails: every error along the way becomes
    /// [`RecommendationOutcome::Failed`] carrying the team id.
    pub async fn get_captain_recommendations(&self, team_id: u64) -> RecommendationOutcome {
        match self
            .load_team(team_id)
            .await
            .with_context(|| format!("failed to fetch data for team {team_id}"))
        {
            Ok(team) => self.recommend_for(&team).await,
            Err(err) => failed_outcome(team_id, &err),
        }
    }

    /// The prompt, model and parse half of a run, over already-fetched data.
    pub async fn recommend_for(&self, team: &TeamData) -> RecommendationOutcome {
        match self.try_recommend(team).await {
            Ok(outcome) => outcome,
            Err(err) => failed_outcome(team.team_id(), &err),
        }
    }

    async fn try_recommend(&self, team: &TeamData) -> anyhow::Result<RecommendationOutcome> {
        let ctx = team.prompt_context();
        let prompt = ctx.render();

        tracing::info!(
            team_id = team.team_id(),
            candidates = ctx.candidates.len(),
            provider = %self.llm.provider(),
            model = self.llm.model(),
            prompt_chars = prompt.len(),
            "calling LLM for captain recommendations"
        );
        let reply = self.llm.complete(&prompt).await?;

        Ok(interpret_reply(&reply, &ctx.candidate_ids()))
    }
}

/// The `{error, team_id}` outcome for a run that failed before a usable reply.
pub fn failed_outcome(team_id: u64, err: &anyhow::Error) -> RecommendationOutcome {
    tracing::error!(team_id, error = %format!("{err:#}"), "recommendation run failed");
    RecommendationOutcome::Failed {
        error: format!("Error getting recommendations: {err:#}"),
        team_id,
    }
}

/// Turns a raw model reply into an outcome.
///
/// Unusable replies come back as [`RecommendationOutcome::Unparseable`] with the
/// raw text attached.
pub fn interpret_reply(reply: &str, candidate_ids: &[u32]) -> RecommendationOutcome {
    let Some(value) = json::parse_model_json(reply) else {
        tracing::warn!(reply_chars = reply.len(), "LLM reply is not JSON");
        return RecommendationOutcome::unparseable(reply);
    };

    let set = serde_json::from_value::<LlmCaptainResponse>(value)
        .map_err(anyhow::Error::from)
        .and_then(LlmCaptainResponse::validate_and_into_set);

    match set {
        Ok(set) => {
            for rec in &set.recommendations {
                if let Some(id) = rec.player_id {
                    if !candidate_ids.contains(&id) {
                        tracing::warn!(
                            rank = rec.rank,
                            player_id = id,
                            player_name = %rec.player_name,
                            "LLM recommended a player outside the starting eleven"
                        );
                    }
                }
            }
            RecommendationOutcome::Recommended(set)
        }
        Err(err) => {
            tracing::warn!(error = %err, "LLM reply failed contract validation");
            RecommendationOutcome::Unparseable {
                error: format!("Invalid LLM response: {err}"),
                raw_response: reply.to_string(),
            }
        }
    }
}
