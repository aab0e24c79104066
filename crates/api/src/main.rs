use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use captain_core::config::Settings;
use captain_core::domain::player::{FixtureRow, SquadOverview};
use captain_core::domain::recommendation::RecommendationOutcome;
use captain_core::error::CaptainError;
use captain_core::fpl::{FplClient, FplSource, HttpFplSource};
use captain_core::llm::LlmClient;
use captain_core::recommender::CaptainRecommender;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let window = settings.require_gameweek_window()?;
    let source: Arc<dyn FplSource> = Arc::new(HttpFplSource::from_settings(&settings)?);

    let llm = match captain_core::llm::from_settings(&settings) {
        Ok(llm) => Some(llm),
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "LLM client unavailable; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        source,
        llm,
        window,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/fixtures", get(get_fixtures))
        .route("/teams/:team_id/squad", get(get_squad))
        .route("/teams/:team_id/recommendations", get(get_recommendations))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Shared across requests. Each request gets its own caching `FplClient`.
#[derive(Clone)]
struct AppState {
    source: Arc<dyn FplSource>,
    llm: Option<Arc<dyn LlmClient>>,
    window: u32,
}

#[derive(Debug, Deserialize)]
struct WindowQuery {
    window: Option<u32>,
}

impl WindowQuery {
    fn resolve(&self, default: u32) -> Result<u32, StatusCode> {
        match self.window.unwrap_or(default) {
            0 => Err(StatusCode::BAD_REQUEST),
            window => Ok(window),
        }
    }
}

#[derive(Debug, Serialize)]
struct FixturesView {
    current_gameweek: u32,
    window: u32,
    fixtures: Vec<FixtureRow>,
}

async fn get_fixtures(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<FixturesView>, StatusCode> {
    let window = query.resolve(state.window)?;

    let fpl = FplClient::new(state.source.clone());
    let catalog = fpl.fetch_catalog().await.map_err(upstream_status)?;
    let fixtures = fpl.fetch_fixtures(window).await.map_err(upstream_status)?;

    Ok(Json(FixturesView {
        current_gameweek: fpl.current_gameweek().await.map_err(upstream_status)?,
        window,
        fixtures: captain_core::fpl::mapper::fixture_rows(&catalog, &fixtures),
    }))
}

async fn get_squad(
    State(state): State<AppState>,
    Path(team_id): Path<u64>,
) -> Result<Json<SquadOverview>, StatusCode> {
    let fpl = FplClient::new(state.source.clone());
    let catalog = fpl.fetch_catalog().await.map_err(upstream_status)?;
    let snapshot = fpl
        .fetch_team_snapshot(team_id)
        .await
        .map_err(upstream_status)?;

    Ok(Json(captain_core::fpl::mapper::squad_overview(
        &catalog, &snapshot,
    )))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Path(team_id): Path<u64>,
    Query(query): Query<WindowQuery>,
) -> Result<(StatusCode, Json<RecommendationOutcome>), StatusCode> {
    let Some(llm) = &state.llm else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let window = query.resolve(state.window)?;

    let recommender = CaptainRecommender::new(
        FplClient::new(state.source.clone()),
        llm.clone(),
        window,
    );
    let outcome = recommender.get_captain_recommendations(team_id).await;

    let status = match &outcome {
        RecommendationOutcome::Recommended(_) => StatusCode::OK,
        RecommendationOutcome::Unparseable { .. } | RecommendationOutcome::Failed { .. } => {
            if let Some(error) = outcome.error_message() {
                sentry::capture_message(error, sentry::Level::Error);
            }
            StatusCode::BAD_GATEWAY
        }
    };

    Ok((status, Json(outcome)))
}

fn upstream_status(err: CaptainError) -> StatusCode {
    let status = match &err {
        CaptainError::UpstreamUnavailable { .. } | CaptainError::UnexpectedPayload { .. } => {
            StatusCode::BAD_GATEWAY
        }
        CaptainError::Configuration(_) | CaptainError::HttpClient(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let err = anyhow::Error::new(err);
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, %status, "sports data request failed");
    status
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_query_falls_back_to_default_and_rejects_zero() {
        assert_eq!(WindowQuery { window: None }.resolve(3), Ok(3));
        assert_eq!(WindowQuery { window: Some(5) }.resolve(3), Ok(5));
        assert_eq!(
            WindowQuery { window: Some(0) }.resolve(3),
            Err(StatusCode::BAD_REQUEST)
        );
    }
}
