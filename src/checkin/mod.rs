//! Check-In
//!
//! The staff check-in desk: a polled golfer roster with client-side
//! search, a tri-state filter, and optimistic check-in/undo actions.
//!
//! - [`filter`]: search term and category filter over the roster
//! - [`desk`]: the mounted desk with its optimistic overlay
//! - [`command`]: parsing of typed desk input

mod command;
mod desk;
mod filter;

pub use command::DeskCommand;
pub use desk::{CheckInDesk, DeskRow, SyncState};
pub use filter::{CheckInFilter, FilterState};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::client::{ApiClient, ApiResult, Endpoint};
use crate::leaderboard::TournamentSummary;
use crate::poll::{RankedItem, SnapshotSource};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Confirmed,
    #[default]
    Pending,
    Waitlisted,
    Cancelled,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Unpaid,
    Pending,
    Refunded,
    #[serde(other)]
    Other,
}

/// A registered golfer as seen by the check-in desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Golfer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub registration_status: RegistrationStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Set once the golfer has checked in
    #[serde(default)]
    pub checked_in_at: Option<String>,
}

impl Golfer {
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }

    /// Fields the desk search looks at
    pub fn searchable_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.email.as_deref())
            .chain(self.phone.as_deref())
    }
}

impl RankedItem for Golfer {
    fn identity(&self) -> String {
        self.id.to_string()
    }

    fn display_value(&self) -> String {
        self.checked_in_at.clone().unwrap_or_default()
    }
}

/// Response of the admin tournament endpoint; only the roster is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub tournament: Option<TournamentSummary>,
    #[serde(default)]
    pub golfers: Vec<Golfer>,
}

/// Write actions available at the desk
#[async_trait]
pub trait CheckInActions: Send + Sync + 'static {
    async fn check_in(&self, golfer_id: u64) -> ApiResult<()>;

    async fn undo_check_in(&self, golfer_id: u64) -> ApiResult<()>;
}

/// The roster of one tournament, read and written with an admin session
#[derive(Debug, Clone)]
pub struct AdminRoster {
    client: Arc<ApiClient>,
    session: Session,
    org_slug: String,
    tournament_slug: String,
}

impl AdminRoster {
    pub fn new(
        client: Arc<ApiClient>,
        session: Session,
        org_slug: impl Into<String>,
        tournament_slug: impl Into<String>,
    ) -> Self {
        Self {
            client,
            session,
            org_slug: org_slug.into(),
            tournament_slug: tournament_slug.into(),
        }
    }

    /// Back-link for the error screen
    pub fn parent_context(&self) -> String {
        format!(
            "/admin/organizations/{}/tournaments/{}",
            self.org_slug, self.tournament_slug
        )
    }
}

#[async_trait]
impl SnapshotSource for AdminRoster {
    type Item = Golfer;
    type Meta = Option<TournamentSummary>;

    fn target(&self) -> String {
        Endpoint::admin_tournament(&self.org_slug, &self.tournament_slug)
            .identity()
            .unwrap_or_else(|_| format!("roster:{}/{}", self.org_slug, self.tournament_slug))
    }

    async fn fetch(&self) -> ApiResult<(Option<TournamentSummary>, Vec<Golfer>)> {
        let response = self
            .client
            .tournament_roster(&self.org_slug, &self.tournament_slug, &self.session)
            .await?;
        Ok((response.tournament, response.golfers))
    }
}

#[async_trait]
impl CheckInActions for AdminRoster {
    async fn check_in(&self, golfer_id: u64) -> ApiResult<()> {
        self.client.check_in(golfer_id, &self.session).await
    }

    async fn undo_check_in(&self, golfer_id: u64) -> ApiResult<()> {
        self.client.undo_check_in(golfer_id, &self.session).await
    }
}
