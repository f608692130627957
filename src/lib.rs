//! # Fairway
//!
//! Live views over a golf tournament management API: a public leaderboard,
//! a raffle board, and the staff check-in desk.
//!
//! ## Features
//!
//! - **Polling views**: fetch once on mount, then re-fetch on an interval
//! - **Change highlighting**: rows whose value changed pulse for a short time
//! - **Graceful failures**: stale data stays visible, or the view blocks with a retry
//! - **Optimistic check-in**: the desk shows a check-in before the server confirms it
//!
//! ## Modules
//!
//! - [`client`]: HTTP client for the tournament API
//! - [`session`]: explicit auth context for admin calls
//! - [`poll`]: the generic polling view and snapshot diffing
//! - [`leaderboard`]: live leaderboard source
//! - [`raffle`]: live raffle board source
//! - [`checkin`]: roster filter and the check-in desk
//! - [`notice`]: transient feedback messages
//! - [`render`]: plain-text rendering for the CLI
//! - [`config`]: TOML config with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fairway::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(ApiClient::new(ClientConfig::default())?);
//!
//!     // Poll the leaderboard every 30 seconds
//!     let view = PollingView::mount(
//!         LeaderboardSource::new(client, "spring-scramble"),
//!         ViewConfig::every(Duration::from_secs(30)),
//!     );
//!
//!     let mut updates = view.subscribe();
//!     updates.changed().await?;
//!
//!     let rows = view.rows(|entry, cue| format!("{} {}", cue.badge.symbol(), entry.value)).await;
//!     println!("{} players", rows.len());
//!
//!     // Dropping the view stops polling
//!     view.unmount();
//!     Ok(())
//! }
//! ```

pub mod checkin;
pub mod client;
pub mod config;
pub mod leaderboard;
pub mod notice;
pub mod poll;
pub mod raffle;
pub mod render;
pub mod session;

// Re-export top-level types for convenience
pub use client::{ApiClient, ApiError, ApiResult, ClientConfig, Endpoint};

pub use session::{Credential, Environment, Session, SessionError, SessionResult};

pub use poll::{
    FailurePolicy, PollingView, RankBadge, RankedEntry, RankedItem, RefreshState, RowCue,
    Snapshot, SnapshotSource, ViewConfig, ViewState, ViewStatus,
};

pub use leaderboard::{LeaderboardEntry, LeaderboardHeader, LeaderboardSource, ScoringType};

pub use raffle::{Prize, PrizeTier, RaffleBoard, RaffleHeader, RaffleSource};

pub use checkin::{
    AdminRoster, CheckInActions, CheckInDesk, CheckInFilter, DeskCommand, DeskRow, FilterState,
    Golfer, SyncState,
};

pub use notice::{Notice, NoticeBoard, NoticeLevel};

pub use config::{Config, ConfigError, ConfigResult, LoadReport, LoggingConfig};
