//! Raw record shapes returned by the Fantasy Premier League public API.
//!
//! The upstream schema changes between seasons and several numeric stats are
//! sent as strings. Every record therefore keeps the fields this crate reads,
//! marks anything the API may omit or null as optional, and collects
//! unrecognized keys into a flattened `extra` map.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Extra = BTreeMap<String, Value>;

/// `GET /bootstrap-static/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapStatic {
    #[serde(default)]
    pub chips: Vec<Chip>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub game_settings: Option<GameSettings>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub total_players: Option<u64>,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub element_types: Vec<ElementType>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub rules: BTreeMap<String, Value>,
    #[serde(default)]
    pub scoring: BTreeMap<String, Value>,
    #[serde(default)]
    pub element_types: Vec<Value>,
    #[serde(default)]
    pub pick_multiplier: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chip {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub start_event: Option<u32>,
    #[serde(default)]
    pub stop_event: Option<u32>,
    #[serde(default)]
    pub chip_type: Option<String>,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipPlay {
    pub chip_name: String,
    pub num_played: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopElementInfo {
    pub id: u32,
    pub points: i64,
}

/// One gameweek of the season calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deadline_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub release_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub average_entry_score: Option<i64>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub data_checked: bool,
    #[serde(default)]
    pub highest_scoring_entry: Option<u64>,
    #[serde(default)]
    pub highest_score: Option<i64>,
    #[serde(default)]
    pub is_previous: bool,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub is_next: bool,
    #[serde(default)]
    pub can_enter: Option<bool>,
    #[serde(default)]
    pub can_manage: Option<bool>,
    #[serde(default)]
    pub released: Option<bool>,
    #[serde(default)]
    pub ranked_count: Option<u64>,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(default)]
    pub chip_plays: Vec<ChipPlay>,
    #[serde(default)]
    pub most_selected: Option<u32>,
    #[serde(default)]
    pub most_transferred_in: Option<u32>,
    #[serde(default)]
    pub top_element: Option<u32>,
    #[serde(default)]
    pub top_element_info: Option<TopElementInfo>,
    #[serde(default)]
    pub transfers_made: Option<u64>,
    #[serde(default)]
    pub most_captained: Option<u32>,
    #[serde(default)]
    pub most_vice_captained: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default)]
    pub squad_squadplay: Option<u32>,
    #[serde(default)]
    pub squad_squadsize: Option<u32>,
    #[serde(default)]
    pub squad_team_limit: Option<u32>,
    #[serde(default)]
    pub squad_total_spend: Option<u32>,
    #[serde(default)]
    pub transfers_cap: Option<u32>,
    #[serde(default)]
    pub stats_form_days: Option<u32>,
    #[serde(default)]
    pub sys_vice_captain_enabled: Option<bool>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A Premier League club.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
    #[serde(default)]
    pub code: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub played: i64,
    #[serde(default)]
    pub win: i64,
    #[serde(default)]
    pub draw: i64,
    #[serde(default)]
    pub loss: i64,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub strength: Option<i64>,
    #[serde(default)]
    pub strength_overall_home: Option<i64>,
    #[serde(default)]
    pub strength_overall_away: Option<i64>,
    #[serde(default)]
    pub strength_attack_home: Option<i64>,
    #[serde(default)]
    pub strength_attack_away: Option<i64>,
    #[serde(default)]
    pub strength_defence_home: Option<i64>,
    #[serde(default)]
    pub strength_defence_away: Option<i64>,
    #[serde(default)]
    pub team_division: Option<i64>,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub pulse_id: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A playing position (GKP, DEF, MID, FWD).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementType {
    pub id: u32,
    #[serde(default)]
    pub plural_name: String,
    #[serde(default)]
    pub plural_name_short: String,
    pub singular_name: String,
    #[serde(default)]
    pub singular_name_short: String,
    #[serde(default)]
    pub squad_select: Option<u32>,
    #[serde(default)]
    pub squad_min_play: Option<u32>,
    #[serde(default)]
    pub squad_max_play: Option<u32>,
    #[serde(default)]
    pub element_count: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A footballer as listed in the bootstrap catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: u32,
    #[serde(default)]
    pub code: Option<u64>,
    pub element_type: u32,
    pub team: u32,
    #[serde(default)]
    pub team_code: Option<u32>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub web_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub news: String,
    #[serde(default)]
    pub news_added: Option<DateTime<Utc>>,
    #[serde(default)]
    pub chance_of_playing_next_round: Option<u8>,
    #[serde(default)]
    pub chance_of_playing_this_round: Option<u8>,
    #[serde(default)]
    pub squad_number: Option<u32>,
    #[serde(default)]
    pub can_select: bool,
    #[serde(default)]
    pub can_transact: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(default)]
    pub special: bool,
    #[serde(default)]
    pub in_dreamteam: bool,
    #[serde(default)]
    pub dreamteam_count: i64,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub team_join_date: Option<NaiveDate>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,

    pub now_cost: i64,
    #[serde(default)]
    pub cost_change_event: i64,
    #[serde(default)]
    pub cost_change_event_fall: i64,
    #[serde(default)]
    pub cost_change_start: i64,
    #[serde(default)]
    pub cost_change_start_fall: i64,

    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub event_points: i64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub form: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub points_per_game: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub selected_by_percent: f64,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub ep_next: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub ep_this: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value_form: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub value_season: f64,

    #[serde(default)]
    pub transfers_in: i64,
    #[serde(default)]
    pub transfers_in_event: i64,
    #[serde(default)]
    pub transfers_out: i64,
    #[serde(default)]
    pub transfers_out_event: i64,

    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub starts: i64,
    #[serde(default)]
    pub goals_scored: i64,
    #[serde(default)]
    pub assists: i64,
    #[serde(default)]
    pub clean_sheets: i64,
    #[serde(default)]
    pub goals_conceded: i64,
    #[serde(default)]
    pub own_goals: i64,
    #[serde(default)]
    pub penalties_saved: i64,
    #[serde(default)]
    pub penalties_missed: i64,
    #[serde(default)]
    pub yellow_cards: i64,
    #[serde(default)]
    pub red_cards: i64,
    #[serde(default)]
    pub saves: i64,
    #[serde(default)]
    pub bonus: i64,
    #[serde(default)]
    pub bps: i64,

    #[serde(default, deserialize_with = "lenient::number")]
    pub influence: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub creativity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub threat: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub ict_index: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expected_goals: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expected_assists: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expected_goal_involvements: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub expected_goals_conceded: f64,

    #[serde(default)]
    pub penalties_order: Option<u32>,
    #[serde(default)]
    pub direct_freekicks_order: Option<u32>,
    #[serde(default)]
    pub corners_and_indirect_freekicks_order: Option<u32>,

    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatEntry {
    pub value: i64,
    pub element: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureStat {
    pub identifier: String,
    #[serde(default)]
    pub a: Vec<StatEntry>,
    #[serde(default)]
    pub h: Vec<StatEntry>,
}

/// One entry of `GET /fixtures/`.
///
/// `event` and `kickoff_time` are null for fixtures that have not been
/// scheduled into a gameweek yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFixture {
    pub id: u32,
    #[serde(default)]
    pub code: Option<u64>,
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub finished_provisional: bool,
    #[serde(default)]
    pub kickoff_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub provisional_start_time: bool,
    #[serde(default)]
    pub started: Option<bool>,
    pub team_a: u32,
    #[serde(default)]
    pub team_a_score: Option<i64>,
    pub team_h: u32,
    #[serde(default)]
    pub team_h_score: Option<i64>,
    #[serde(default)]
    pub stats: Vec<FixtureStat>,
    pub team_h_difficulty: u8,
    pub team_a_difficulty: u8,
    #[serde(default)]
    pub pulse_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicLeague {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub league_type: Option<String>,
    #[serde(default)]
    pub entry_rank: Option<u64>,
    #[serde(default)]
    pub entry_last_rank: Option<u64>,
    #[serde(default)]
    pub rank_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leagues {
    #[serde(default)]
    pub classic: Vec<ClassicLeague>,
    #[serde(default)]
    pub h2h: Vec<Value>,
    #[serde(default)]
    pub cup: Option<Value>,
    #[serde(default)]
    pub cup_matches: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `GET /entry/{id}/`: the manager and their team metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub player_first_name: String,
    #[serde(default)]
    pub player_last_name: String,
    #[serde(default)]
    pub player_region_name: Option<String>,
    #[serde(default)]
    pub joined_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_event: Option<u32>,
    #[serde(default)]
    pub favourite_team: Option<u32>,
    #[serde(default)]
    pub years_active: Option<u32>,
    #[serde(default)]
    pub summary_overall_points: Option<i64>,
    #[serde(default)]
    pub summary_overall_rank: Option<u64>,
    #[serde(default)]
    pub summary_event_points: Option<i64>,
    #[serde(default)]
    pub summary_event_rank: Option<u64>,
    #[serde(default)]
    pub current_event: Option<u32>,
    #[serde(default)]
    pub last_deadline_bank: Option<i64>,
    #[serde(default)]
    pub last_deadline_value: Option<i64>,
    #[serde(default)]
    pub last_deadline_total_transfers: Option<i64>,
    #[serde(default)]
    pub leagues: Option<Leagues>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    pub element: u32,
    #[serde(default)]
    pub position: u8,
    /// 0 on the bench, 1 in the starting eleven, 2 or 3 once a captaincy
    /// bonus has been applied.
    pub multiplier: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub is_vice_captain: bool,
    #[serde(default)]
    pub element_type: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomaticSub {
    #[serde(default)]
    pub entry: Option<u64>,
    pub element_in: u32,
    pub element_out: u32,
    #[serde(default)]
    pub event: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryHistory {
    pub event: u32,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub total_points: i64,
    #[serde(default)]
    pub rank: Option<u64>,
    #[serde(default)]
    pub overall_rank: Option<u64>,
    #[serde(default)]
    pub percentile_rank: Option<u64>,
    #[serde(default)]
    pub bank: i64,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub event_transfers: i64,
    #[serde(default)]
    pub event_transfers_cost: i64,
    #[serde(default)]
    pub points_on_bench: i64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// `GET /entry/{id}/event/{gw}/picks/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPicks {
    #[serde(default)]
    pub active_chip: Option<String>,
    #[serde(default)]
    pub automatic_subs: Vec<AutomaticSub>,
    #[serde(default)]
    pub entry_history: Option<EntryHistory>,
    #[serde(default)]
    pub picks: Vec<Pick>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Deserializers for stats the API sends either as JSON numbers or as decimal
/// strings (`"7.5"`).
pub(crate) mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    fn parse<E: Error>(raw: &str) -> Result<Option<f64>, E> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<f64>()
            .map(Some)
            .map_err(|_| E::custom(format!("expected a decimal string, got {raw:?}")))
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(optional_number(deserializer)?.unwrap_or(0.0))
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrString::Number(n)) => Ok(Some(n)),
            Some(NumberOrString::String(s)) => parse(&s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn element_json() -> Value {
        json!({
            "id": 328,
            "code": 118748,
            "element_type": 3,
            "team": 12,
            "first_name": "Mohamed",
            "second_name": "Salah",
            "web_name": "M.Salah",
            "status": "a",
            "news": "",
            "news_added": null,
            "chance_of_playing_next_round": null,
            "now_cost": 130,
            "total_points": 211,
            "form": "7.5",
            "points_per_game": "6.8",
            "selected_by_percent": "45.3",
            "ep_next": "8.1",
            "ep_this": null,
            "expected_goals": "18.42",
            "goals_scored": 19,
            "assists": 12,
            "bonus": 25,
            "influence_rank": 2,
            "brand_new_upstream_field": {"nested": true}
        })
    }

    #[test]
    fn element_coerces_string_stats() {
        let element: Element = serde_json::from_value(element_json()).unwrap();
        assert_eq!(element.form, 7.5);
        assert_eq!(element.points_per_game, 6.8);
        assert_eq!(element.selected_by_percent, 45.3);
        assert_eq!(element.ep_next, Some(8.1));
        assert_eq!(element.ep_this, None);
        assert_eq!(element.expected_goals, 18.42);
        assert_eq!(element.chance_of_playing_next_round, None);
    }

    #[test]
    fn element_keeps_unknown_keys_in_extra() {
        let element: Element = serde_json::from_value(element_json()).unwrap();
        assert_eq!(element.extra.get("influence_rank"), Some(&json!(2)));
        assert_eq!(
            element.extra.get("brand_new_upstream_field"),
            Some(&json!({"nested": true}))
        );
    }

    #[test]
    fn element_accepts_numeric_stats_too() {
        let mut v = element_json();
        v["form"] = json!(4);
        v["selected_by_percent"] = json!(0.2);
        let element: Element = serde_json::from_value(v).unwrap();
        assert_eq!(element.form, 4.0);
        assert_eq!(element.selected_by_percent, 0.2);
    }

    #[test]
    fn element_rejects_garbage_numeric_strings() {
        let mut v = element_json();
        v["form"] = json!("n/a");
        assert!(serde_json::from_value::<Element>(v).is_err());
    }

    #[test]
    fn unscheduled_fixture_has_no_event() {
        let fixture: RawFixture = serde_json::from_value(json!({
            "id": 380,
            "event": null,
            "finished": false,
            "kickoff_time": null,
            "team_h": 1,
            "team_a": 2,
            "team_h_difficulty": 3,
            "team_a_difficulty": 4,
            "stats": []
        }))
        .unwrap();
        assert_eq!(fixture.event, None);
        assert_eq!(fixture.kickoff_time, None);
    }

    #[test]
    fn picks_payload_decodes_chip_and_subs() {
        let picks: EntryPicks = serde_json::from_value(json!({
            "active_chip": "3xc",
            "automatic_subs": [
                {"entry": 42, "element_in": 7, "element_out": 8, "event": 5}
            ],
            "entry_history": {
                "event": 5, "points": 61, "total_points": 301, "rank": 100,
                "overall_rank": 2000, "bank": 5, "value": 1003,
                "event_transfers": 1, "event_transfers_cost": 0, "points_on_bench": 4
            },
            "picks": [
                {"element": 1, "position": 1, "multiplier": 1, "is_captain": false, "is_vice_captain": false, "element_type": 1}
            ]
        }))
        .unwrap();
        assert_eq!(picks.active_chip.as_deref(), Some("3xc"));
        assert_eq!(picks.automatic_subs[0].element_in, 7);
        assert_eq!(picks.entry_history.unwrap().value, 1003);
        assert_eq!(picks.picks.len(), 1);
    }
}
