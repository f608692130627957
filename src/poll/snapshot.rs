//! Snapshots and Change Detection
//!
//! A snapshot is one successful fetch, positioned and diffed against the
//! snapshot it replaces. Entries are never edited after construction.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::time::{Duration, Instant};

/// An item that can appear in a polled list
pub trait RankedItem: Clone + Send + Sync + 'static {
    /// Unique key used to match the item across refreshes
    fn identity(&self) -> String;

    /// The value shown to viewers; a change between refreshes pulses the row
    fn display_value(&self) -> String;

    /// Server-assigned position, if the payload carries one
    fn position(&self) -> Option<u32> {
        None
    }
}

/// A positioned item with its derived change flag
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<T> {
    pub position: u32,
    /// Unique within the snapshot; repeated item identities get a `#n` suffix
    pub identity: String,
    pub value: String,
    /// Value differs from the same identity in the previous snapshot
    pub changed: bool,
    /// When the value last changed, carried across refreshes that keep it
    pub changed_at: Option<Instant>,
    pub item: T,
}

/// Visual treatment for a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBadge {
    Gold,
    Silver,
    Bronze,
    Plain(u32),
}

impl RankBadge {
    pub fn from_position(position: u32) -> Self {
        match position {
            1 => RankBadge::Gold,
            2 => RankBadge::Silver,
            3 => RankBadge::Bronze,
            n => RankBadge::Plain(n),
        }
    }

    pub fn is_podium(self) -> bool {
        !matches!(self, RankBadge::Plain(_))
    }

    pub fn symbol(self) -> String {
        match self {
            RankBadge::Gold => "🥇".to_string(),
            RankBadge::Silver => "🥈".to_string(),
            RankBadge::Bronze => "🥉".to_string(),
            RankBadge::Plain(n) => n.to_string(),
        }
    }
}

/// Per-row cues handed to a render function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCue {
    pub badge: RankBadge,
    /// Row changed in the latest refresh and its pulse has not expired
    pub pulsing: bool,
}

/// One successful fetch
#[derive(Debug, Clone)]
pub struct Snapshot<T, M = ()> {
    meta: M,
    entries: Vec<RankedEntry<T>>,
    requested_at: Instant,
    received_at: Instant,
    refreshed_at: DateTime<Utc>,
}

impl<T: RankedItem, M> Snapshot<T, M> {
    /// Build a snapshot from items in server order, diffing against `previous`
    pub fn build(meta: M, items: Vec<T>, previous: Option<&Snapshot<T, M>>) -> Self {
        let received_at = Instant::now();
        let prior: HashMap<&str, (&str, Option<Instant>)> = previous
            .map(|p| {
                p.entries
                    .iter()
                    .map(|e| (e.identity.as_str(), (e.value.as_str(), e.changed_at)))
                    .collect()
            })
            .unwrap_or_default();

        let mut seen: HashMap<String, usize> = HashMap::new();
        let entries = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let identity = unique_identity(&mut seen, item.identity());
                let value = item.display_value();

                // New identities are additions, not changes
                let (changed, changed_at) = match prior.get(identity.as_str()) {
                    Some((old, _)) if *old != value => (true, Some(received_at)),
                    Some((_, since)) => (false, *since),
                    None => (false, None),
                };

                RankedEntry {
                    position: item.position().unwrap_or(index as u32 + 1),
                    identity,
                    value,
                    changed,
                    changed_at,
                    item,
                }
            })
            .collect();

        Self {
            meta,
            entries,
            requested_at: received_at,
            received_at,
            refreshed_at: Utc::now(),
        }
    }

    /// Record when the fetch behind this snapshot was issued
    pub fn with_requested_at(mut self, at: Instant) -> Self {
        self.requested_at = at.min(self.received_at);
        self
    }

    pub fn meta(&self) -> &M {
        &self.meta
    }

    pub fn entries(&self) -> &[RankedEntry<T>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&RankedEntry<T>> {
        self.entries.iter().find(|e| e.identity == identity)
    }

    /// Monotonic instant the fetch was issued; server state is at least this new
    pub fn requested_at(&self) -> Instant {
        self.requested_at
    }

    /// Monotonic instant the snapshot arrived
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Wall-clock time the snapshot arrived
    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// Identities flagged as changed in this refresh
    pub fn changed(&self) -> impl Iterator<Item = &RankedEntry<T>> {
        self.entries.iter().filter(|e| e.changed)
    }

    /// Whether the pulse for `entry` is still running at `now`
    pub fn is_pulsing(&self, entry: &RankedEntry<T>, now: Instant, pulse: Duration) -> bool {
        entry
            .changed_at
            .map(|at| now < at + pulse)
            .unwrap_or(false)
    }

    /// Map every entry through a render function
    pub fn render<R>(
        &self,
        now: Instant,
        pulse: Duration,
        mut render: impl FnMut(&RankedEntry<T>, RowCue) -> R,
    ) -> Vec<R> {
        self.entries
            .iter()
            .map(|entry| {
                let cue = RowCue {
                    badge: RankBadge::from_position(entry.position),
                    pulsing: self.is_pulsing(entry, now, pulse),
                };
                render(entry, cue)
            })
            .collect()
    }
}

/// First occurrence keeps the item identity; repeats become `identity#2`, `identity#3`, ...
fn unique_identity(seen: &mut HashMap<String, usize>, identity: String) -> String {
    let count = seen.entry(identity.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        identity
    } else {
        format!("{}#{}", identity, count)
    }
}
