//! Check-In Desk
//!
//! A polled roster plus local search/filter state and an optimistic
//! overlay for check-in and undo. The overlay sits on top of the snapshot
//! and never edits it: each action records the value it expects, and a
//! snapshot whose fetch was issued after the action resolved supersedes it.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::filter::{display_order, CheckInFilter, FilterState};
use super::{CheckInActions, Golfer};
use crate::client::{ApiError, ApiResult};
use crate::notice::{Notice, NoticeBoard, NoticeLevel};
use crate::poll::{FailurePolicy, PollingView, SnapshotSource, ViewConfig};

/// Where an optimistic change stands with the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
struct Optimistic {
    checked_in_at: Option<String>,
    previous: Option<String>,
    state: SyncState,
    resolved_at: Option<Instant>,
}

impl Optimistic {
    /// Pending changes always apply; resolved ones until a snapshot requested
    /// after the resolution lands
    fn applies_to(&self, snapshot_requested_at: Instant) -> bool {
        match self.resolved_at {
            None => true,
            Some(resolved) => snapshot_requested_at <= resolved,
        }
    }

    fn effective(&self, rollback_on_failure: bool) -> Option<String> {
        match self.state {
            SyncState::Failed if rollback_on_failure => self.previous.clone(),
            _ => self.checked_in_at.clone(),
        }
    }
}

/// One row at the desk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeskRow {
    pub golfer: Golfer,
    /// Present while an optimistic change is shown for this golfer
    pub sync: Option<SyncState>,
    pub pulsing: bool,
}

/// Staff check-in desk for one tournament
pub struct CheckInDesk<S>
where
    S: SnapshotSource<Item = Golfer> + CheckInActions,
{
    view: PollingView<S>,
    actions: Arc<S>,
    filter: RwLock<FilterState>,
    optimistic: RwLock<HashMap<u64, Optimistic>>,
    notices: Mutex<NoticeBoard>,
    rollback_on_failure: bool,
}

impl<S> CheckInDesk<S>
where
    S: SnapshotSource<Item = Golfer> + CheckInActions,
{
    /// Mount the roster view. Load failures always block the desk.
    pub fn open(source: S, config: ViewConfig, rollback_on_failure: bool) -> Self {
        let actions = Arc::new(source);
        let view = PollingView::mount_shared(
            Arc::clone(&actions),
            config.policy(FailurePolicy::Block),
        );

        Self {
            view,
            actions,
            filter: RwLock::new(FilterState::default()),
            optimistic: RwLock::new(HashMap::new()),
            notices: Mutex::new(NoticeBoard::default()),
            rollback_on_failure,
        }
    }

    pub fn view(&self) -> &PollingView<S> {
        &self.view
    }

    pub async fn filter(&self) -> FilterState {
        self.filter.read().await.clone()
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.filter.write().await.search = search.into();
    }

    pub async fn set_category(&self, category: CheckInFilter) {
        self.filter.write().await.category = category;
    }

    /// Every golfer with optimistic changes applied, in desk order
    pub async fn roster(&self) -> Vec<DeskRow> {
        let state = self.view.state().await;
        let Some(snapshot) = state.visible() else {
            return Vec::new();
        };

        let optimistic = self.optimistic.read().await;
        let now = Instant::now();
        let highlight = self.view.highlight();

        let mut rows: Vec<DeskRow> = snapshot
            .entries()
            .iter()
            .map(|entry| {
                let mut golfer = entry.item.clone();
                let overlay = optimistic
                    .get(&golfer.id)
                    .filter(|o| o.applies_to(snapshot.requested_at()));

                if let Some(overlay) = overlay {
                    golfer.checked_in_at = overlay.effective(self.rollback_on_failure);
                }

                DeskRow {
                    golfer,
                    sync: overlay.map(|o| o.state),
                    pulsing: snapshot.is_pulsing(entry, now, highlight),
                }
            })
            .collect();

        rows.sort_by(|a, b| display_order(&a.golfer, &b.golfer));
        rows
    }

    /// Rows matching the current search and category
    pub async fn rows(&self) -> Vec<DeskRow> {
        let filter = self.filter().await;
        let mut rows = self.roster().await;
        rows.retain(|row| filter.matches(&row.golfer));
        rows
    }

    /// Check a golfer in, showing the result immediately
    pub async fn check_in(&self, golfer_id: u64) -> Notice {
        let Some(golfer) = self.find(golfer_id).await else {
            return self
                .notify(NoticeLevel::Error, format!("Golfer {} is not on this roster", golfer_id))
                .await;
        };
        if golfer.is_checked_in() {
            return self
                .notify(NoticeLevel::Info, format!("{} is already checked in", golfer.name))
                .await;
        }

        let stamp = Utc::now().to_rfc3339();
        self.begin(golfer_id, Some(stamp), golfer.checked_in_at.clone())
            .await;

        let result = self.actions.check_in(golfer_id).await;
        self.finish(golfer_id, &golfer.name, "Checked in", result)
            .await
    }

    /// Undo a check-in, showing the result immediately
    pub async fn undo_check_in(&self, golfer_id: u64) -> Notice {
        let Some(golfer) = self.find(golfer_id).await else {
            return self
                .notify(NoticeLevel::Error, format!("Golfer {} is not on this roster", golfer_id))
                .await;
        };
        if !golfer.is_checked_in() {
            return self
                .notify(NoticeLevel::Info, format!("{} is not checked in", golfer.name))
                .await;
        }

        self.begin(golfer_id, None, golfer.checked_in_at.clone())
            .await;

        let result = self.actions.undo_check_in(golfer_id).await;
        self.finish(golfer_id, &golfer.name, "Undid check-in for", result)
            .await
    }

    /// Check in the single visible golfer, if exactly one unchecked row is shown
    pub async fn quick_commit(&self) -> Option<Notice> {
        let rows = self.rows().await;
        match rows.as_slice() {
            [only] if !only.golfer.is_checked_in() => Some(self.check_in(only.golfer.id).await),
            _ => None,
        }
    }

    pub async fn notices(&self) -> Vec<Notice> {
        self.notices.lock().await.active().cloned().collect()
    }

    pub async fn dismiss(&self, notice_id: u64) -> bool {
        self.notices.lock().await.dismiss(notice_id)
    }

    async fn find(&self, golfer_id: u64) -> Option<Golfer> {
        self.roster()
            .await
            .into_iter()
            .map(|row| row.golfer)
            .find(|g| g.id == golfer_id)
    }

    async fn begin(&self, golfer_id: u64, checked_in_at: Option<String>, previous: Option<String>) {
        self.optimistic.write().await.insert(
            golfer_id,
            Optimistic {
                checked_in_at,
                previous,
                state: SyncState::Pending,
                resolved_at: None,
            },
        );
    }

    async fn finish(
        &self,
        golfer_id: u64,
        name: &str,
        verb: &str,
        result: ApiResult<()>,
    ) -> Notice {
        let (state, level, message) = match &result {
            Ok(()) => (
                SyncState::Confirmed,
                NoticeLevel::Success,
                format!("{} {}", verb, name),
            ),
            // The server already has the state we asked for
            Err(ApiError::AlreadyCompleted(msg)) => {
                (SyncState::Confirmed, NoticeLevel::Info, msg.clone())
            }
            Err(e) => (
                SyncState::Failed,
                NoticeLevel::Error,
                format!("{} failed: {}", name, e.user_message()),
            ),
        };

        match &result {
            Err(e) if state == SyncState::Failed => tracing::warn!(
                golfer_id,
                error = %e,
                rolled_back = self.rollback_on_failure,
                "Check-in action failed"
            ),
            _ => tracing::info!(golfer_id, action = verb, "Check-in action confirmed"),
        }

        if let Some(entry) = self.optimistic.write().await.get_mut(&golfer_id) {
            entry.state = state;
            entry.resolved_at = Some(Instant::now());
        }

        self.notify(level, message).await
    }

    async fn notify(&self, level: NoticeLevel, message: String) -> Notice {
        self.notices.lock().await.push(level, message)
    }
}
