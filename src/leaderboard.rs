//! Tournament Leaderboard
//!
//! Response types for the public leaderboard and the snapshot source that
//! lets a polling view follow it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::client::{ApiClient, ApiResult, Endpoint};
use crate::poll::{RankedItem, SnapshotSource};

/// Tournament header shared by the public boards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// How the tournament is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringType {
    #[default]
    Stroke,
    Scramble,
    BestBall,
    Stableford,
    #[serde(other)]
    Other,
}

impl ScoringType {
    /// Team formats list team names rather than players
    pub fn is_team_format(self) -> bool {
        matches!(self, ScoringType::Scramble | ScoringType::BestBall)
    }
}

/// Holes completed: a count, or a label such as "F"
///
/// Anything else the server sends decodes to `Other` rather than failing
/// the whole board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Thru {
    Holes(i64),
    Label(String),
    Other(serde_json::Value),
}

impl fmt::Display for Thru {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Thru::Holes(18) => f.write_str("F"),
            Thru::Holes(n) if (0..18).contains(n) => write!(f, "{}", n),
            Thru::Label(s) => f.write_str(s),
            Thru::Holes(_) | Thru::Other(_) => f.write_str("-"),
        }
    }
}

/// One leaderboard row, already ranked by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: u32,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub golfer_id: Option<u64>,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub total_strokes: Option<i32>,
    #[serde(default)]
    pub total_relative: Option<i32>,
    #[serde(default)]
    pub thru: Option<Thru>,
    #[serde(default)]
    pub display_score: Option<String>,
}

impl LeaderboardEntry {
    /// Team name for team formats, otherwise the player name
    pub fn label(&self) -> String {
        self.team_name
            .as_deref()
            .or(self.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.position))
    }

    /// Server-formatted score, falling back to the relative total
    pub fn score(&self) -> String {
        match (&self.display_score, self.total_relative) {
            (Some(display), _) if !display.is_empty() => display.clone(),
            (_, Some(relative)) => format_relative(relative),
            _ => "-".to_string(),
        }
    }

    pub fn thru_label(&self) -> String {
        self.thru
            .as_ref()
            .map(Thru::to_string)
            .unwrap_or_else(|| "-".to_string())
    }
}

impl RankedItem for LeaderboardEntry {
    /// Server ids when present; names are not unique on a large field
    fn identity(&self) -> String {
        if let Some(id) = self.team_id {
            format!("team:{}", id)
        } else if let Some(id) = self.golfer_id {
            format!("golfer:{}", id)
        } else if let Some(id) = self.id {
            format!("entry:{}", id)
        } else {
            self.label()
        }
    }

    fn display_value(&self) -> String {
        self.score()
    }

    fn position(&self) -> Option<u32> {
        Some(self.position)
    }
}

/// Response of `GET /tournaments/{id}/scores/leaderboard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default)]
    pub tournament: TournamentSummary,
    #[serde(default)]
    pub scoring_type: ScoringType,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Header shown above the leaderboard rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaderboardHeader {
    pub tournament: TournamentSummary,
    pub scoring_type: ScoringType,
}

/// Score relative to par: "E", "+3", "-2"
pub fn format_relative(relative: i32) -> String {
    match relative {
        0 => "E".to_string(),
        r if r > 0 => format!("+{}", r),
        r => r.to_string(),
    }
}

/// Polls the public leaderboard of one tournament
#[derive(Debug, Clone)]
pub struct LeaderboardSource {
    client: Arc<ApiClient>,
    tournament_id: String,
}

impl LeaderboardSource {
    pub fn new(client: Arc<ApiClient>, tournament_id: impl Into<String>) -> Self {
        Self {
            client,
            tournament_id: tournament_id.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for LeaderboardSource {
    type Item = LeaderboardEntry;
    type Meta = LeaderboardHeader;

    fn target(&self) -> String {
        Endpoint::leaderboard(&self.tournament_id)
            .identity()
            .unwrap_or_else(|_| format!("leaderboard:{}", self.tournament_id))
    }

    async fn fetch(&self) -> ApiResult<(LeaderboardHeader, Vec<LeaderboardEntry>)> {
        let response = self.client.leaderboard(&self.tournament_id).await?;
        let header = LeaderboardHeader {
            tournament: response.tournament,
            scoring_type: response.scoring_type,
        };
        Ok((header, response.leaderboard))
    }
}
