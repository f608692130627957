//! Notices
//!
//! Dismissible success/error notifications for single actions such as a
//! check-in. A failed action becomes a notice; the view stays intact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn icon(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Info => "ℹ",
            NoticeLevel::Error => "✕",
        }
    }
}

/// Bounded queue of active notices, oldest first
#[derive(Debug)]
pub struct NoticeBoard {
    notices: VecDeque<Notice>,
    next_id: u64,
    capacity: usize,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::with_capacity(5)
    }
}

impl NoticeBoard {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notices: VecDeque::new(),
            next_id: 1,
            capacity: capacity.max(1),
        }
    }

    /// Add a notice, evicting the oldest when full
    pub fn push(&mut self, level: NoticeLevel, message: impl Into<String>) -> Notice {
        let notice = Notice {
            id: self.next_id,
            level,
            message: message.into(),
            created_at: Utc::now(),
        };
        self.next_id += 1;

        if self.notices.len() == self.capacity {
            self.notices.pop_front();
        }
        self.notices.push_back(notice.clone());
        notice
    }

    /// Dismiss a notice by id; returns whether it was present
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    pub fn active(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
