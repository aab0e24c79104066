//! Joins raw catalog records into the typed domain records.
//!
//! Every mapping keeps the catalog's element order so downstream text built
//! from the results is stable for a given snapshot.

use crate::domain::player::{
    Fixture, FixtureRow, InjuryStatus, OwnershipStats, Player, SquadOverview, SquadRow,
    TeamSnapshot,
};
use crate::fpl::types::{BootstrapStatic, Element, RawFixture};
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_SHORT: &str = "UNK";
pub const DIFFICULTY_RANGE: RangeInclusive<u8> = 1..=5;

/// Team and position names keyed by upstream id.
#[derive(Debug, Clone)]
pub struct Lookups<'a> {
    pub team_names: HashMap<u32, &'a str>,
    pub team_short_names: HashMap<u32, &'a str>,
    pub positions: HashMap<u32, &'a str>,
}

impl<'a> Lookups<'a> {
    pub fn from_catalog(catalog: &'a BootstrapStatic) -> Self {
        Self {
            team_names: catalog
                .teams
                .iter()
                .map(|t| (t.id, t.name.as_str()))
                .collect(),
            team_short_names: catalog
                .teams
                .iter()
                .map(|t| (t.id, t.short_name.as_str()))
                .collect(),
            positions: catalog
                .element_types
                .iter()
                .map(|p| (p.id, p.singular_name.as_str()))
                .collect(),
        }
    }

    pub fn team_name(&self, team_id: u32) -> &'a str {
        self.team_names.get(&team_id).copied().unwrap_or(UNKNOWN)
    }

    pub fn team_short_name(&self, team_id: u32) -> &'a str {
        self.team_short_names
            .get(&team_id)
            .copied()
            .unwrap_or(UNKNOWN_SHORT)
    }

    pub fn position(&self, element_type: u32) -> &'a str {
        self.positions.get(&element_type).copied().unwrap_or(UNKNOWN)
    }
}

fn selected<'a>(
    catalog: &'a BootstrapStatic,
    player_ids: &[u32],
) -> impl Iterator<Item = &'a Element> {
    let wanted: HashSet<u32> = player_ids.iter().copied().collect();
    catalog
        .elements
        .iter()
        .filter(move |e| wanted.contains(&e.id))
}

pub fn map_player(element: &Element, lookups: &Lookups<'_>) -> Player {
    Player {
        id: element.id,
        name: format!("{} {}", element.first_name, element.second_name)
            .trim()
            .to_string(),
        web_name: element.web_name.clone(),
        team_id: element.team,
        team: lookups.team_name(element.team).to_string(),
        position: lookups.position(element.element_type).to_string(),
        price: element.now_cost as f64 / 10.0,
        now_cost: element.now_cost,
        total_points: element.total_points,
        form: element.form,
        points_per_game: element.points_per_game,
        selected_by_percent: element.selected_by_percent,
        goals_scored: element.goals_scored,
        assists: element.assists,
        clean_sheets: element.clean_sheets,
        minutes: element.minutes,
        bonus: element.bonus,
    }
}

/// Players whose id is in `player_ids`, in catalog order.
pub fn map_players(catalog: &BootstrapStatic, player_ids: &[u32]) -> Vec<Player> {
    let lookups = Lookups::from_catalog(catalog);
    selected(catalog, player_ids)
        .map(|e| map_player(e, &lookups))
        .collect()
}

pub fn injury_status(element: &Element) -> String {
    let mut notes = Vec::new();
    if let Some(chance) = element.chance_of_playing_next_round {
        if chance < 100 {
            notes.push(format!("Injury risk: {chance}%"));
        }
    }
    let news = element.news.trim();
    if !news.is_empty() {
        notes.push(news.to_string());
    }

    if notes.is_empty() {
        InjuryStatus::AVAILABLE.to_string()
    } else {
        notes.join("; ")
    }
}

pub fn injury_updates(catalog: &BootstrapStatic, player_ids: &[u32]) -> Vec<InjuryStatus> {
    selected(catalog, player_ids)
        .map(|e| InjuryStatus {
            player_id: e.id,
            status: injury_status(e),
        })
        .collect()
}

pub fn ownership_stats(catalog: &BootstrapStatic, player_ids: &[u32]) -> Vec<OwnershipStats> {
    selected(catalog, player_ids)
        .map(|e| OwnershipStats {
            player_id: e.id,
            selected_by_percent: e.selected_by_percent,
            transfers_in_event: e.transfers_in_event,
            transfers_out_event: e.transfers_out_event,
            cost_change_event: e.cost_change_event,
        })
        .collect()
}

/// Unfinished fixtures whose gameweek lies in `[current, current + window_size - 1]`.
///
/// Fixtures rated outside [`DIFFICULTY_RANGE`] on either side are dropped.
pub fn upcoming_fixtures(raw: &[RawFixture], current: u32, window_size: u32) -> Vec<Fixture> {
    if window_size == 0 {
        return Vec::new();
    }
    let last = current.saturating_add(window_size - 1);

    raw.iter()
        .filter(|f| !f.finished)
        .filter_map(|f| {
            let gameweek = f.event?;
            if !(current..=last).contains(&gameweek) {
                return None;
            }
            if !DIFFICULTY_RANGE.contains(&f.team_h_difficulty)
                || !DIFFICULTY_RANGE.contains(&f.team_a_difficulty)
            {
                tracing::warn!(
                    fixture_id = f.id,
                    gameweek,
                    team_h_difficulty = f.team_h_difficulty,
                    team_a_difficulty = f.team_a_difficulty,
                    "skipping fixture with out-of-range difficulty"
                );
                return None;
            }
            Some(Fixture {
                id: f.id,
                team_h: f.team_h,
                team_a: f.team_a,
                team_h_difficulty: f.team_h_difficulty,
                team_a_difficulty: f.team_a_difficulty,
                kickoff_time: f.kickoff_time,
                gameweek,
            })
        })
        .collect()
}

/// Fixtures with full club names, for display.
pub fn fixture_rows(catalog: &BootstrapStatic, fixtures: &[Fixture]) -> Vec<FixtureRow> {
    let lookups = Lookups::from_catalog(catalog);
    fixtures
        .iter()
        .map(|f| FixtureRow {
            gameweek: f.gameweek,
            home_team: lookups.team_name(f.team_h).to_string(),
            away_team: lookups.team_name(f.team_a).to_string(),
            home_difficulty: f.team_h_difficulty,
            away_difficulty: f.team_a_difficulty,
            kickoff_time: f.kickoff_time,
        })
        .collect()
}

/// Difficulty ratings `team_id` faces across `fixtures`, in fixture order.
pub fn team_fixture_difficulty(fixtures: &[Fixture], team_id: u32) -> Vec<u8> {
    fixtures
        .iter()
        .filter_map(|f| f.difficulty_for(team_id))
        .collect()
}

pub fn squad_overview(catalog: &BootstrapStatic, snapshot: &TeamSnapshot) -> SquadOverview {
    let ids = snapshot.player_ids();
    let players = map_players(catalog, &ids);
    let statuses: HashMap<u32, String> = injury_updates(catalog, &ids)
        .into_iter()
        .map(|s| (s.player_id, s.status))
        .collect();

    let rows = players
        .into_iter()
        .map(|player| {
            let pick = snapshot.pick_for(player.id);
            let status = statuses
                .get(&player.id)
                .cloned()
                .unwrap_or_else(|| InjuryStatus::AVAILABLE.to_string());
            SquadRow {
                starting: snapshot.is_captain_eligible(player.id),
                is_captain: pick.map(|p| p.is_captain).unwrap_or(false),
                is_vice_captain: pick.map(|p| p.is_vice_captain).unwrap_or(false),
                status,
                player,
            }
        })
        .collect();

    SquadOverview {
        team_id: snapshot.team_id,
        team_name: snapshot.team_info.name.clone(),
        gameweek: snapshot.gameweek,
        overall_points: snapshot.team_info.summary_overall_points,
        overall_rank: snapshot.team_info.summary_overall_rank,
        team_value: snapshot.team_value(),
        active_chip: snapshot.active_chip.clone(),
        rows,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fpl::types::RawFixture;
    use serde_json::{json, Value};

    pub(crate) fn element(id: u32, team: u32, element_type: u32) -> Value {
        json!({
            "id": id,
            "element_type": element_type,
            "team": team,
            "first_name": format!("First{id}"),
            "second_name": format!("Last{id}"),
            "web_name": format!("Last{id}"),
            "status": "a",
            "news": "",
            "chance_of_playing_next_round": null,
            "now_cost": 75,
            "total_points": 100 + id as i64,
            "form": "7.5",
            "points_per_game": "5.1",
            "selected_by_percent": "12.3",
            "transfers_in_event": 1500,
            "transfers_out_event": 300,
            "cost_change_event": 1,
            "goals_scored": 6,
            "assists": 4,
            "clean_sheets": 2,
            "minutes": 900,
            "bonus": 7
        })
    }

    pub(crate) fn catalog_json(elements: Vec<Value>) -> Value {
        json!({
            "events": [{"id": 5, "name": "Gameweek 5", "is_current": true}],
            "teams": [
                {"id": 1, "name": "Arsenal", "short_name": "ARS"},
                {"id": 2, "name": "Liverpool", "short_name": "LIV"}
            ],
            "element_types": [
                {"id": 3, "singular_name": "Midfielder"},
                {"id": 4, "singular_name": "Forward"}
            ],
            "elements": elements,
            "total_players": 10_000_000u64
        })
    }

    fn catalog(elements: Vec<Value>) -> BootstrapStatic {
        serde_json::from_value(catalog_json(elements)).unwrap()
    }

    #[test]
    fn maps_only_requested_players_in_catalog_order() {
        let cat = catalog(vec![element(3, 1, 3), element(1, 2, 4), element(2, 1, 3)]);
        let players = map_players(&cat, &[2, 3, 99]);
        let ids: Vec<_> = players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn coerces_numeric_strings_and_joins_lookups() {
        let cat = catalog(vec![element(1, 2, 4)]);
        let player = &map_players(&cat, &[1])[0];
        assert_eq!(player.name, "First1 Last1");
        assert_eq!(player.team, "Liverpool");
        assert_eq!(player.position, "Forward");
        assert_eq!(player.price, 7.5);
        assert_eq!(player.form, 7.5);
        assert_eq!(player.points_per_game, 5.1);
        assert_eq!(player.selected_by_percent, 12.3);
    }

    #[test]
    fn unknown_team_and_position_map_to_placeholder() {
        let cat = catalog(vec![element(1, 77, 9)]);
        let player = &map_players(&cat, &[1])[0];
        assert_eq!(player.team, UNKNOWN);
        assert_eq!(player.position, UNKNOWN);
        assert_eq!(Lookups::from_catalog(&cat).team_short_name(77), UNKNOWN_SHORT);
    }

    #[test]
    fn injury_status_combines_risk_and_news() {
        let mut hurt = element(1, 1, 3);
        hurt["chance_of_playing_next_round"] = json!(75);
        hurt["news"] = json!("Hamstring injury - 75% chance of playing");
        let mut fit = element(2, 1, 3);
        fit["chance_of_playing_next_round"] = json!(100);
        let cat = catalog(vec![hurt, fit]);

        let statuses = injury_updates(&cat, &[1, 2]);
        assert_eq!(
            statuses[0].status,
            "Injury risk: 75%; Hamstring injury - 75% chance of playing"
        );
        assert!(statuses[1].is_available());
    }

    #[test]
    fn ownership_stats_carry_transfer_deltas() {
        let cat = catalog(vec![element(1, 1, 3)]);
        let stats = &ownership_stats(&cat, &[1])[0];
        assert_eq!(stats.selected_by_percent, 12.3);
        assert_eq!(stats.transfers_in_event, 1500);
        assert_eq!(stats.transfers_out_event, 300);
        assert_eq!(stats.cost_change_event, 1);
    }

    fn raw(id: u32, event: Option<u32>, finished: bool) -> RawFixture {
        serde_json::from_value(crate::fpl::client::tests::raw_fixture(id, event, finished))
            .unwrap()
    }

    #[test]
    fn window_upper_bound_is_inclusive() {
        let fixtures = vec![
            raw(1, Some(4), false),
            raw(2, Some(5), false),
            raw(3, Some(7), false),
            raw(4, Some(8), false),
            raw(5, None, false),
        ];
        let upcoming = upcoming_fixtures(&fixtures, 5, 3);
        let gws: Vec<_> = upcoming.iter().map(|f| f.gameweek).collect();
        assert_eq!(gws, vec![5, 7]);
    }

    #[test]
    fn finished_fixtures_are_excluded() {
        let fixtures = vec![raw(1, Some(5), true), raw(2, Some(6), false)];
        let upcoming = upcoming_fixtures(&fixtures, 5, 3);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, 2);
    }

    #[test]
    fn out_of_range_difficulty_is_dropped() {
        let mut bad: RawFixture = raw(1, Some(5), false);
        bad.team_h_difficulty = 0;
        bad.team_a_difficulty = 9;
        let mut high_away = raw(2, Some(5), false);
        high_away.team_a_difficulty = 6;
        let fixtures = vec![bad, high_away, raw(3, Some(5), false)];

        let upcoming = upcoming_fixtures(&fixtures, 5, 1);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, 3);
        assert!(upcoming
            .iter()
            .all(|f| DIFFICULTY_RANGE.contains(&f.team_h_difficulty)
                && DIFFICULTY_RANGE.contains(&f.team_a_difficulty)));
    }

    #[test]
    fn fixture_rows_use_full_club_names() {
        let catalog = catalog(vec![]);
        let mut away_unknown = raw(2, Some(6), false);
        away_unknown.team_a = 99;
        let fixtures = upcoming_fixtures(&[raw(1, Some(5), false), away_unknown], 5, 3);

        let rows = fixture_rows(&catalog, &fixtures);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].gameweek, 5);
        assert_eq!(rows[0].home_team, "Arsenal");
        assert_eq!(rows[0].away_team, "Liverpool");
        assert_eq!((rows[0].home_difficulty, rows[0].away_difficulty), (2, 4));
        assert!(rows[0].kickoff_time.is_some());
        assert_eq!(rows[1].away_team, UNKNOWN);
    }

    #[test]
    fn zero_window_is_empty() {
        assert!(upcoming_fixtures(&[raw(1, Some(5), false)], 5, 0).is_empty());
    }

    #[test]
    fn team_difficulty_reads_own_side() {
        let fixtures = upcoming_fixtures(
            &[raw(1, Some(5), false), raw(2, Some(6), false)],
            5,
            3,
        );
        assert_eq!(team_fixture_difficulty(&fixtures, 1), vec![2, 2]);
        assert_eq!(team_fixture_difficulty(&fixtures, 2), vec![4, 4]);
        assert!(team_fixture_difficulty(&fixtures, 3).is_empty());
    }
}
