//! Roster Filter
//!
//! Search term plus category filter. Applying a filter never touches the
//! roster itself; it only selects and orders a visible subset.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use super::Golfer;

/// Which golfers to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInFilter {
    #[default]
    All,
    NotCheckedIn,
    CheckedIn,
}

impl CheckInFilter {
    pub fn admits(self, golfer: &Golfer) -> bool {
        match self {
            CheckInFilter::All => true,
            CheckInFilter::NotCheckedIn => !golfer.is_checked_in(),
            CheckInFilter::CheckedIn => golfer.is_checked_in(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckInFilter::All => "all",
            CheckInFilter::NotCheckedIn => "not checked in",
            CheckInFilter::CheckedIn => "checked in",
        }
    }
}

impl FromStr for CheckInFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(CheckInFilter::All),
            "not_checked_in" | "pending" | "unresolved" => Ok(CheckInFilter::NotCheckedIn),
            "checked_in" | "done" | "resolved" => Ok(CheckInFilter::CheckedIn),
            other => Err(format!("Unknown filter: {}", other)),
        }
    }
}

/// Search term and category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub category: CheckInFilter,
}

impl FilterState {
    pub fn new(search: impl Into<String>, category: CheckInFilter) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    /// Case-insensitive substring match on any searchable field
    pub fn matches_search(&self, golfer: &Golfer) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || golfer
                .searchable_fields()
                .any(|field| field.to_lowercase().contains(&needle))
    }

    pub fn matches(&self, golfer: &Golfer) -> bool {
        self.category.admits(golfer) && self.matches_search(golfer)
    }

    /// Visible subset: not checked in first, then by name
    pub fn apply<'a>(&self, roster: &'a [Golfer]) -> Vec<&'a Golfer> {
        let mut visible: Vec<&Golfer> = roster.iter().filter(|g| self.matches(g)).collect();
        visible.sort_by(|a, b| display_order(a, b));
        visible
    }
}

/// Desk ordering: not checked in first, then by name, then by id
pub fn display_order(a: &Golfer, b: &Golfer) -> Ordering {
    a.is_checked_in()
        .cmp(&b.is_checked_in())
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}
