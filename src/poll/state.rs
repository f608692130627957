//! View State
//!
//! Status, refresh bookkeeping and the latest snapshot of a polling view.

use chrono::{DateTime, Utc};
use tokio::time::Duration;

use super::snapshot::Snapshot;
use crate::client::ApiError;

/// What a failed refresh does to an already-visible snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep showing the last good snapshot; its timestamp goes stale
    #[default]
    KeepStale,
    /// Replace the view with an error screen until a refresh succeeds
    Block,
}

/// Load status of a view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStatus {
    /// No fetch has resolved yet for the current target
    Loading,
    /// The latest fetch succeeded
    Ready,
    /// The latest fetch failed
    Unavailable {
        error: ApiError,
        /// Where a retry/back affordance should lead, e.g. the tournament page
        parent: Option<String>,
    },
}

/// Refresh bookkeeping owned by the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshState {
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub auto_refresh_enabled: bool,
    pub manual_refresh_in_flight: bool,
}

/// Everything a renderer needs from a polling view
#[derive(Debug, Clone)]
pub struct ViewState<T, M = ()> {
    pub status: ViewStatus,
    pub snapshot: Option<Snapshot<T, M>>,
    pub refresh: RefreshState,
    pub policy: FailurePolicy,
}

impl<T, M> ViewState<T, M> {
    pub(crate) fn new(auto_refresh_enabled: bool, policy: FailurePolicy) -> Self {
        Self {
            status: ViewStatus::Loading,
            snapshot: None,
            refresh: RefreshState {
                last_refreshed_at: None,
                auto_refresh_enabled,
                manual_refresh_in_flight: false,
            },
            policy,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ViewStatus::Loading
    }

    pub fn error(&self) -> Option<&ApiError> {
        match &self.status {
            ViewStatus::Unavailable { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Snapshot to show, honouring the failure policy
    pub fn visible(&self) -> Option<&Snapshot<T, M>> {
        match (&self.status, self.policy) {
            (ViewStatus::Unavailable { .. }, FailurePolicy::Block) => None,
            _ => self.snapshot.as_ref(),
        }
    }

    /// Showing an old snapshot because the latest refresh failed
    pub fn is_stale(&self) -> bool {
        self.error().is_some() && self.visible().is_some()
    }

    /// Time since the last successful refresh
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.refresh
            .last_refreshed_at
            .and_then(|at| (now - at).to_std().ok())
    }
}
