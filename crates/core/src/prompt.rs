//! Captaincy prompt assembly.
//!
//! The rendered prompt depends only on its [`PromptContext`]: no clocks, no
//! hash-map iteration. Rendering the same context twice yields identical bytes.

use crate::domain::player::{Fixture, InjuryStatus, OwnershipStats, Player, TeamSnapshot};
use crate::fpl::mapper::{self, Lookups};
use crate::fpl::types::BootstrapStatic;
use std::collections::HashMap;
use std::fmt::Write as _;

pub const MAX_FIXTURE_LINES: usize = 15;

const OUTPUT_SCHEMA: &str = r#"{
    "recommendations": [
        {
            "rank": 1,
            "player_name": "Player Name",
            "player_id": 123,
            "reasoning": "Detailed explanation of why this is the best choice",
            "key_factors": ["factor1", "factor2", "factor3"],
            "risk_level": "Low/Medium/High",
            "differential_potential": "Template/Semi-differential/High differential"
        },
        {
            "rank": 2,
            "player_name": "Player Name",
            "player_id": 456,
            "reasoning": "Detailed explanation",
            "key_factors": ["factor1", "factor2"],
            "risk_level": "Low/Medium/High",
            "differential_potential": "Template/Semi-differential/High differential"
        },
        {
            "rank": 3,
            "player_name": "Player Name",
            "player_id": 789,
            "reasoning": "Detailed explanation",
            "key_factors": ["factor1", "factor2"],
            "risk_level": "Low/Medium/High",
            "differential_potential": "Template/Semi-differential/High differential"
        }
    ],
    "general_advice": "Overall strategy considerations for this gameweek"
}"#;

const ANALYSIS_FACTORS: &str = "\
Consider these factors in your analysis:
1. Recent form and consistency
2. Fixture difficulty and matchup analysis
3. Injury/rotation risks
4. Ownership levels and differential potential
5. Historical performance vs upcoming opponents
6. Price and value considerations
7. Team motivation and context

Focus on players who are likely to start and have good scoring potential.
Return ONLY the JSON object, with exactly 3 recommendations ranked 1, 2 and 3.";

/// A starting-eleven player offered to the model as a captain option.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub player: Player,
    pub fixture_difficulty: Vec<u8>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureLine {
    pub gameweek: u32,
    pub home: String,
    pub away: String,
    pub home_difficulty: u8,
    pub away_difficulty: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsLine {
    pub player_name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnershipLine {
    pub player_name: String,
    pub stats: OwnershipStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptContext {
    pub current_gameweek: u32,
    pub window_size: u32,
    pub candidates: Vec<Candidate>,
    pub fixtures: Vec<FixtureLine>,
    pub injury_news: Vec<NewsLine>,
    pub ownership: Vec<OwnershipLine>,
}

impl PromptContext {
    /// Joins one fetched snapshot into prompt sections.
    ///
    /// Candidates are the starting eleven only; injury and ownership lines cover
    /// the whole squad. All sections follow catalog order.
    pub fn build(
        catalog: &BootstrapStatic,
        snapshot: &TeamSnapshot,
        fixtures: &[Fixture],
        window_size: u32,
    ) -> Self {
        let squad_ids = snapshot.player_ids();
        let players = mapper::map_players(catalog, &squad_ids);
        let names: HashMap<u32, &str> = players.iter().map(|p| (p.id, p.name.as_str())).collect();

        let injuries = mapper::injury_updates(catalog, &squad_ids);
        let statuses: HashMap<u32, &str> = injuries
            .iter()
            .map(|s| (s.player_id, s.status.as_str()))
            .collect();

        let eligible = snapshot.captain_eligible_ids();
        let candidates = players
            .iter()
            .filter(|p| eligible.contains(&p.id))
            .map(|p| Candidate {
                fixture_difficulty: mapper::team_fixture_difficulty(fixtures, p.team_id),
                status: statuses
                    .get(&p.id)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| InjuryStatus::AVAILABLE.to_string()),
                player: p.clone(),
            })
            .collect();

        let lookups = Lookups::from_catalog(catalog);
        let fixture_lines = fixtures
            .iter()
            .take(MAX_FIXTURE_LINES)
            .map(|f| FixtureLine {
                gameweek: f.gameweek,
                home: lookups.team_short_name(f.team_h).to_string(),
                away: lookups.team_short_name(f.team_a).to_string(),
                home_difficulty: f.team_h_difficulty,
                away_difficulty: f.team_a_difficulty,
            })
            .collect();

        let injury_news = injuries
            .iter()
            .filter(|s| !s.is_available())
            .filter_map(|s| {
                names.get(&s.player_id).map(|name| NewsLine {
                    player_name: name.to_string(),
                    status: s.status.clone(),
                })
            })
            .collect();

        let ownership = mapper::ownership_stats(catalog, &squad_ids)
            .into_iter()
            .filter_map(|stats| {
                names.get(&stats.player_id).map(|name| OwnershipLine {
                    player_name: name.to_string(),
                    stats,
                })
            })
            .collect();

        Self {
            current_gameweek: snapshot.gameweek,
            window_size,
            candidates,
            fixtures: fixture_lines,
            injury_news,
            ownership,
        }
    }

    pub fn candidate_ids(&self) -> Vec<u32> {
        self.candidates.iter().map(|c| c.player.id).collect()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(
            "You are an expert Fantasy Premier League analyst. Your task is to recommend 3 \
             different captain choices for the given team, ranking them from best to worst \
             with detailed reasoning.\n\n",
        );
        let _ = writeln!(out, "CURRENT GAMEWEEK: {}\n", self.current_gameweek);

        out.push_str("AVAILABLE CAPTAIN OPTIONS:\n");
        for candidate in &self.candidates {
            render_candidate(&mut out, candidate, self.window_size);
        }
        out.push('\n');

        let _ = writeln!(
            out,
            "UPCOMING FIXTURES (next {} gameweeks):",
            self.window_size
        );
        if self.fixtures.is_empty() {
            out.push_str("No upcoming fixtures in this window.\n");
        }
        for f in &self.fixtures {
            let _ = writeln!(
                out,
                "GW{}: {} vs {} (Difficulty: {}-{})",
                f.gameweek, f.home, f.away, f.home_difficulty, f.away_difficulty
            );
        }
        out.push('\n');

        out.push_str("INJURY/AVAILABILITY NEWS:\n");
        if self.injury_news.is_empty() {
            out.push_str("No injury concerns reported.\n");
        }
        for line in &self.injury_news {
            let _ = writeln!(out, "- {}: {}", line.player_name, line.status);
        }
        out.push('\n');

        out.push_str("OWNERSHIP DATA:\n");
        for line in &self.ownership {
            let _ = writeln!(
                out,
                "- {}: {:.1}% owned, Transfers: +{} -{}, Price change: {:+.1}m",
                line.player_name,
                line.stats.selected_by_percent,
                line.stats.transfers_in_event,
                line.stats.transfers_out_event,
                line.stats.cost_change_event as f64 / 10.0
            );
        }
        out.push('\n');

        out.push_str(
            "Please analyze and provide exactly 3 captain recommendations in the following JSON format:\n",
        );
        out.push_str(OUTPUT_SCHEMA);
        out.push_str("\n\n");
        out.push_str(ANALYSIS_FACTORS);
        out.push('\n');
        out
    }
}

fn render_candidate(out: &mut String, candidate: &Candidate, window_size: u32) {
    let p = &candidate.player;
    let difficulty = candidate
        .fixture_difficulty
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let _ = writeln!(out, "- {} [id {}] ({}) - {}", p.name, p.id, p.team, p.position);
    let _ = writeln!(
        out,
        "  * Price: £{:.1}m | Total Points: {} | Form: {:.1}",
        p.price, p.total_points, p.form
    );
    let _ = writeln!(
        out,
        "  * PPG: {:.1} | Goals: {} | Assists: {} | Bonus: {}",
        p.points_per_game, p.goals_scored, p.assists, p.bonus
    );
    let _ = writeln!(
        out,
        "  * Ownership: {:.1}% | Minutes: {}",
        p.selected_by_percent, p.minutes
    );
    let _ = writeln!(
        out,
        "  * Fixture Difficulty (next {window_size}): [{difficulty}]"
    );
    let _ = writeln!(out, "  * Status: {}", candidate.status);
}
