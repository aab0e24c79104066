use anyhow::Context;
use captain_core::domain::player::{FixtureRow, SquadOverview};
use captain_core::domain::recommendation::RecommendationOutcome;
use captain_core::fpl::{FplClient, HttpFplSource};
use captain_core::llm::Provider;
use captain_core::recommender::{failed_outcome, CaptainRecommender};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "captain_worker")]
struct Args {
    /// FPL manager team id.
    #[arg(long)]
    team_id: u64,

    /// Gameweeks of fixtures to consider, starting at the current one.
    #[arg(long)]
    window: Option<u32>,

    /// LLM provider: openai or anthropic.
    #[arg(long)]
    provider: Option<Provider>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    /// Write the outcome JSON to this path.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the squad before the recommendations.
    #[arg(long)]
    show_squad: bool,

    /// Print the fixtures in the window before the recommendations.
    #[arg(long)]
    show_fixtures: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut settings = captain_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    if let Some(window) = args.window {
        settings.gameweek_window = window;
    }
    if let Some(provider) = args.provider {
        settings.llm_provider = provider;
    }
    if args.model.is_some() {
        settings.llm_model = args.model.clone();
    }
    if args.temperature.is_some() {
        settings.llm_temperature = args.temperature;
    }

    let window = settings.require_gameweek_window()?;
    let source = Arc::new(HttpFplSource::from_settings(&settings)?);
    let llm = captain_core::llm::from_settings(&settings)?;
    let recommender = CaptainRecommender::new(FplClient::new(source), llm, window);

    tracing::info!(team_id = args.team_id, window, provider = %settings.llm_provider, "fetching captain recommendations");
    let outcome = match recommender.load_team(args.team_id).await {
        Ok(team) => {
            if args.show_squad {
                print_squad(&team.squad_overview());
            }
            if args.show_fixtures {
                print_fixtures(&team.fixture_rows(), window);
            }
            recommender.recommend_for(&team).await
        }
        Err(err) => {
            let err = anyhow::Error::new(err)
                .context(format!("failed to fetch data for team {}", args.team_id));
            sentry_anyhow::capture_anyhow(&err);
            failed_outcome(args.team_id, &err)
        }
    };
    print_outcome(&outcome);

    if let Some(path) = &args.export {
        let body = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, body)
            .with_context(|| format!("failed to write export to {}", path.display()))?;
        tracing::info!(path = %path.display(), "exported recommendation outcome");
    }

    Ok(())
}

fn print_squad(overview: &SquadOverview) {
    println!("=== {} (GW{}) ===", overview.team_name, overview.gameweek);
    if let Some(points) = overview.overall_points {
        println!("Overall points: {points}");
    }
    if let Some(rank) = overview.overall_rank {
        println!("Overall rank: {rank}");
    }
    if let Some(value) = overview.team_value {
        println!("Team value: £{value:.1}m");
    }
    if let Some(chip) = &overview.active_chip {
        println!("Active chip: {chip}");
    }
    println!();

    for (label, starting) in [("Starting XI", true), ("Bench", false)] {
        println!("{label}:");
        for row in overview.rows.iter().filter(|r| r.starting == starting) {
            let armband = if row.is_captain {
                " (C)"
            } else if row.is_vice_captain {
                " (V)"
            } else {
                ""
            };
            println!(
                "  {}{} - {} {} £{:.1}m, {} pts, form {:.1} [{}]",
                row.player.name,
                armband,
                row.player.team,
                row.player.position,
                row.player.price,
                row.player.total_points,
                row.player.form,
                row.status
            );
        }
        println!();
    }
}

fn print_fixtures(rows: &[FixtureRow], window: u32) {
    println!("=== UPCOMING FIXTURES (next {window} gameweeks) ===");
    if rows.is_empty() {
        println!("No upcoming fixtures in this window.");
    }
    for row in rows {
        let kickoff = row
            .kickoff_time
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "TBC".to_string());
        println!(
            "  GW{}: {} vs {} (Difficulty: {}-{}) {}",
            row.gameweek,
            row.home_team,
            row.away_team,
            row.home_difficulty,
            row.away_difficulty,
            kickoff
        );
    }
    println!();
}

fn print_outcome(outcome: &RecommendationOutcome) {
    match outcome {
        RecommendationOutcome::Recommended(set) => {
            println!("=== CAPTAIN RECOMMENDATIONS ===\n");
            for rec in &set.recommendations {
                println!("{}. {}", rec.rank, rec.player_name);
                println!("   Risk Level: {}", rec.risk_level.label());
                println!("   Differential: {}", rec.differential_potential.label());
                println!("   Reasoning: {}", rec.reasoning);
                println!("   Key Factors: {}", rec.key_factors.join(", "));
                println!();
            }
            if !set.general_advice.is_empty() {
                println!("General Advice: {}", set.general_advice);
            }
        }
        RecommendationOutcome::Unparseable { error, raw_response } => {
            println!("Error: {error}");
            tracing::debug!(raw_response = %raw_response, "unparseable LLM reply");
        }
        RecommendationOutcome::Failed { error, .. } => {
            println!("Error: {error}");
        }
    }
}

fn init_sentry(settings: &captain_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
