use crate::fpl::types::{AutomaticSub, Entry, EntryHistory, Pick};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A squad member's season-to-date numbers, joined with club and position names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    pub web_name: String,
    pub team_id: u32,
    pub team: String,
    pub position: String,
    /// Price in millions (`now_cost / 10`).
    pub price: f64,
    /// Raw upstream price in tenths of a million.
    pub now_cost: i64,
    pub total_points: i64,
    pub form: f64,
    pub points_per_game: f64,
    pub selected_by_percent: f64,
    pub goals_scored: i64,
    pub assists: i64,
    pub clean_sheets: i64,
    pub minutes: i64,
    pub bonus: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    pub team_h: u32,
    pub team_a: u32,
    pub team_h_difficulty: u8,
    pub team_a_difficulty: u8,
    pub kickoff_time: Option<DateTime<Utc>>,
    pub gameweek: u32,
}

impl Fixture {
    /// Difficulty faced by `team_id` in this fixture, if it plays in it.
    pub fn difficulty_for(&self, team_id: u32) -> Option<u8> {
        if self.team_h == team_id {
            Some(self.team_h_difficulty)
        } else if self.team_a == team_id {
            Some(self.team_a_difficulty)
        } else {
            None
        }
    }
}

/// One row of the upcoming-fixtures view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRow {
    pub gameweek: u32,
    pub home_team: String,
    pub away_team: String,
    pub home_difficulty: u8,
    pub away_difficulty: u8,
    pub kickoff_time: Option<DateTime<Utc>>,
}

/// A manager's squad for the resolved current gameweek.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team_id: u64,
    pub gameweek: u32,
    pub team_info: Entry,
    pub picks: Vec<Pick>,
    pub active_chip: Option<String>,
    pub automatic_subs: Vec<AutomaticSub>,
    pub entry_history: Option<EntryHistory>,
}

impl TeamSnapshot {
    pub fn player_ids(&self) -> Vec<u32> {
        self.picks.iter().map(|p| p.element).collect()
    }

    pub fn pick_for(&self, player_id: u32) -> Option<&Pick> {
        self.picks.iter().find(|p| p.element == player_id)
    }

    /// Starting-eleven members; benched picks carry multiplier 0.
    pub fn is_captain_eligible(&self, player_id: u32) -> bool {
        self.pick_for(player_id)
            .map(|p| p.multiplier >= 1)
            .unwrap_or(false)
    }

    pub fn captain_eligible_ids(&self) -> Vec<u32> {
        self.picks
            .iter()
            .filter(|p| p.multiplier >= 1)
            .map(|p| p.element)
            .collect()
    }

    /// Team value in millions at the last deadline.
    pub fn team_value(&self) -> Option<f64> {
        self.team_info
            .last_deadline_value
            .map(|v| v as f64 / 10.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryStatus {
    pub player_id: u32,
    /// "Available" or a `"; "`-joined list of risk and news notes.
    pub status: String,
}

impl InjuryStatus {
    pub const AVAILABLE: &'static str = "Available";

    pub fn is_available(&self) -> bool {
        self.status == Self::AVAILABLE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipStats {
    pub player_id: u32,
    pub selected_by_percent: f64,
    pub transfers_in_event: i64,
    pub transfers_out_event: i64,
    /// Price change this gameweek in tenths of a million.
    pub cost_change_event: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadRow {
    pub player: Player,
    pub starting: bool,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    pub status: String,
}

/// Squad view offered to presentation surfaces alongside a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadOverview {
    pub team_id: u64,
    pub team_name: String,
    pub gameweek: u32,
    pub overall_points: Option<i64>,
    pub overall_rank: Option<u64>,
    pub team_value: Option<f64>,
    pub active_chip: Option<String>,
    pub rows: Vec<SquadRow>,
}
