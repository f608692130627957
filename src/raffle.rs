//! Raffle Board
//!
//! Prizes and their winners for a tournament's raffle, polled so that
//! newly drawn winners show up on every screen.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::client::{ApiClient, ApiResult, Endpoint};
use crate::leaderboard::TournamentSummary;
use crate::poll::{RankedItem, SnapshotSource};

/// Prize tier, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrizeTier {
    Grand,
    Premium,
    #[default]
    Standard,
    #[serde(other)]
    Other,
}

/// Winner of a drawn prize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeWinner {
    pub name: String,
    #[serde(default)]
    pub ticket_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub tier: PrizeTier,
    #[serde(default)]
    pub won: bool,
    #[serde(default)]
    pub winner: Option<PrizeWinner>,
}

impl Prize {
    /// Winner name, or "Available" while undrawn
    pub fn status_label(&self) -> String {
        match (&self.winner, self.won) {
            (Some(winner), _) => winner.name.clone(),
            (None, true) => "Drawn".to_string(),
            (None, false) => "Available".to_string(),
        }
    }
}

impl RankedItem for Prize {
    fn identity(&self) -> String {
        self.id.to_string()
    }

    fn display_value(&self) -> String {
        self.status_label()
    }
}

/// Ticket and prize counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaffleStats {
    #[serde(default)]
    pub total_prizes: u32,
    #[serde(default)]
    pub prizes_won: u32,
    #[serde(default)]
    pub prizes_remaining: u32,
    #[serde(default)]
    pub tickets_sold: u32,
}

/// Response of `GET /tournaments/{id}/raffle/board`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaffleBoard {
    #[serde(default)]
    pub tournament: TournamentSummary,
    #[serde(default)]
    pub prizes: Vec<Prize>,
    #[serde(default)]
    pub stats: RaffleStats,
}

/// Header shown above the prize list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RaffleHeader {
    pub tournament: TournamentSummary,
    pub stats: RaffleStats,
}

/// Polls the raffle board of one tournament
#[derive(Debug, Clone)]
pub struct RaffleSource {
    client: Arc<ApiClient>,
    tournament_id: String,
}

impl RaffleSource {
    pub fn new(client: Arc<ApiClient>, tournament_id: impl Into<String>) -> Self {
        Self {
            client,
            tournament_id: tournament_id.into(),
        }
    }
}

#[async_trait]
impl SnapshotSource for RaffleSource {
    type Item = Prize;
    type Meta = RaffleHeader;

    fn target(&self) -> String {
        Endpoint::raffle_board(&self.tournament_id)
            .identity()
            .unwrap_or_else(|_| format!("raffle:{}", self.tournament_id))
    }

    async fn fetch(&self) -> ApiResult<(RaffleHeader, Vec<Prize>)> {
        let board = self.client.raffle_board(&self.tournament_id).await?;
        let header = RaffleHeader {
            tournament: board.tournament,
            stats: board.stats,
        };
        Ok((header, board.prizes))
    }
}
