//! Polling Data Views
//!
//! A view fetches a remote list, refreshes it on a fixed interval, and
//! flags rows whose value changed between refreshes:
//!
//! - [`snapshot`]: positioned entries and change detection
//! - [`state`]: load status, refresh bookkeeping, failure policy
//! - [`view`]: the mounted view with its timer lifecycle

mod snapshot;
mod state;
mod view;

pub use snapshot::{RankBadge, RankedEntry, RankedItem, RowCue, Snapshot};
pub use state::{FailurePolicy, RefreshState, ViewState, ViewStatus};
pub use view::{PollingView, SnapshotSource, ViewConfig, MIN_INTERVAL};
