//! Terminal Rendering
//!
//! Turns view state into plain text tables for the CLI. Rows that changed
//! in the latest refresh are marked with `*` until their pulse expires.

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use tokio::time::{Duration, Instant};

use crate::checkin::{DeskRow, FilterState, SyncState};
use crate::leaderboard::{LeaderboardEntry, LeaderboardHeader};
use crate::notice::Notice;
use crate::poll::{RankedEntry, RowCue, ViewState, ViewStatus};
use crate::raffle::{Prize, PrizeTier, RaffleHeader};

const PULSE_MARK: &str = "*";

/// One-line status: loading, last update, or the failure
pub fn status_line<T, M>(state: &ViewState<T, M>, now: DateTime<Utc>) -> String {
    let updated = state.refresh.last_refreshed_at.map(|at| {
        let age = state.age(now).unwrap_or_default().as_secs();
        format!(
            "updated {} ({}s ago)",
            at.with_timezone(&Local).format("%H:%M:%S"),
            age
        )
    });

    let mut line = match (&state.status, updated) {
        (ViewStatus::Loading, _) => "Loading...".to_string(),
        (ViewStatus::Ready, Some(updated)) => format!("Live, {}", updated),
        (ViewStatus::Ready, None) => "Live".to_string(),
        (ViewStatus::Unavailable { error, .. }, Some(updated)) if state.is_stale() => {
            format!("Unavailable ({}); showing data {}", error.user_message(), updated)
        }
        (ViewStatus::Unavailable { error, parent }, _) => {
            let mut msg = format!("Unavailable: {}. Press r to retry", error.user_message());
            if let Some(parent) = parent {
                let _ = write!(msg, " or go back to {}", parent);
            }
            msg
        }
    };

    if state.refresh.manual_refresh_in_flight {
        line.push_str(" [refreshing]");
    }
    if !state.refresh.auto_refresh_enabled {
        line.push_str(" [auto refresh off]");
    }
    line
}

fn badge_cell(cue: RowCue) -> String {
    let mark = if cue.pulsing { PULSE_MARK } else { " " };
    format!("{}{:>3}", mark, cue.badge.symbol())
}

/// Render function for one leaderboard row
pub fn leaderboard_row(entry: &RankedEntry<LeaderboardEntry>, cue: RowCue) -> String {
    let strokes = entry
        .item
        .total_strokes
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{}  {:<28} {:>6} {:>7} {:>5}",
        badge_cell(cue),
        truncate(&entry.item.label(), 28),
        entry.value,
        strokes,
        entry.item.thru_label()
    )
}

pub fn render_leaderboard(
    state: &ViewState<LeaderboardEntry, LeaderboardHeader>,
    highlight: Duration,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    if let Some(snapshot) = state.visible() {
        let header = snapshot.meta();
        let _ = writeln!(
            out,
            "{} - {:?} leaderboard",
            display_name(&header.tournament.name),
            header.scoring_type
        );
        let _ = writeln!(
            out,
            "{:>4}  {:<28} {:>6} {:>7} {:>5}",
            "POS", "PLAYER", "SCORE", "STROKES", "THRU"
        );

        if snapshot.is_empty() {
            let _ = writeln!(out, "  No scores posted yet");
        }
        for row in snapshot.render(Instant::now(), highlight, leaderboard_row) {
            let _ = writeln!(out, "{}", row);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", status_line(state, now));
    out
}

/// Render function for one prize row
pub fn prize_row(entry: &RankedEntry<Prize>, cue: RowCue) -> String {
    let tier = match entry.item.tier {
        PrizeTier::Grand => "GRAND",
        PrizeTier::Premium => "PREMIUM",
        PrizeTier::Standard => "",
        PrizeTier::Other => "-",
    };
    let mark = if cue.pulsing { PULSE_MARK } else { " " };

    format!(
        "{} {:<30} {:<8} {}",
        mark,
        truncate(&entry.item.name, 30),
        tier,
        entry.value
    )
}

pub fn render_raffle(
    state: &ViewState<Prize, RaffleHeader>,
    highlight: Duration,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    if let Some(snapshot) = state.visible() {
        let header = snapshot.meta();
        let _ = writeln!(out, "{} - Raffle", display_name(&header.tournament.name));
        let _ = writeln!(
            out,
            "{} of {} prizes drawn, {} tickets sold",
            header.stats.prizes_won, header.stats.total_prizes, header.stats.tickets_sold
        );
        let _ = writeln!(out);

        for row in snapshot.render(Instant::now(), highlight, prize_row) {
            let _ = writeln!(out, "{}", row);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", status_line(state, now));
    out
}

pub fn desk_row(row: &DeskRow) -> String {
    let mark = if row.pulsing { PULSE_MARK } else { " " };
    let check = if row.golfer.is_checked_in() { "[x]" } else { "[ ]" };
    let sync = match row.sync {
        Some(SyncState::Pending) => " (saving)",
        Some(SyncState::Failed) => " (not saved)",
        Some(SyncState::Confirmed) | None => "",
    };

    format!(
        "{}{} {:>6}  {:<24} {:<28} {:?}/{:?}{}",
        mark,
        check,
        row.golfer.id,
        truncate(&row.golfer.name, 24),
        truncate(row.golfer.email.as_deref().unwrap_or(""), 28),
        row.golfer.registration_status,
        row.golfer.payment_status,
        sync
    )
}

pub fn render_desk(
    rows: &[DeskRow],
    total: usize,
    filter: &FilterState,
    notices: &[Notice],
    status: &str,
) -> String {
    let mut out = String::new();
    let checked = rows.iter().filter(|r| r.golfer.is_checked_in()).count();

    let _ = writeln!(
        out,
        "Check-in: showing {} of {} ({} checked in) | filter: {} | search: {:?}",
        rows.len(),
        total,
        checked,
        filter.category.label(),
        filter.search
    );

    for row in rows {
        let _ = writeln!(out, "{}", desk_row(row));
    }
    if rows.is_empty() && total > 0 {
        let _ = writeln!(out, "  No golfers match");
    }

    for notice in notices {
        let _ = writeln!(out, "{} {}", notice.icon(), notice.message);
    }

    let _ = writeln!(out, "{}", status);
    let _ = writeln!(
        out,
        "type to search | /all /pending /done | Enter: check in single match | +<id>: check in | !<id>: undo | r: refresh | /q: quit"
    );
    out
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "Tournament"
    } else {
        name
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::{CheckInFilter, Golfer, PaymentStatus, RegistrationStatus};
    use crate::client::ApiError;
    use crate::notice::NoticeLevel;
    use crate::poll::{FailurePolicy, RankBadge, Snapshot};

    fn entry(position: u32, name: &str, score: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            position,
            name: Some(name.to_string()),
            total_strokes: Some(70),
            display_score: Some(score.to_string()),
            ..Default::default()
        }
    }

    fn desk(id: u64, name: &str, checked_in: bool, sync: Option<SyncState>) -> DeskRow {
        DeskRow {
            golfer: Golfer {
                id,
                name: name.to_string(),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                phone: None,
                registration_status: RegistrationStatus::Confirmed,
                payment_status: PaymentStatus::Paid,
                checked_in_at: checked_in.then(|| "2026-05-01T08:00:00Z".to_string()),
            },
            sync,
            pulsing: false,
        }
    }

    fn notice(level: NoticeLevel, message: &str) -> Notice {
        Notice {
            id: 1,
            level,
            message: message.to_string(),
            created_at: Utc::now(),
        }
    }

    fn ready_state() -> ViewState<LeaderboardEntry, LeaderboardHeader> {
        let mut state = ViewState::new(true, FailurePolicy::KeepStale);
        state.snapshot = Some(Snapshot::build(
            LeaderboardHeader::default(),
            vec![entry(1, "Ann", "-3"), entry(4, "Ben", "E")],
            None,
        ));
        state.status = ViewStatus::Ready;
        state.refresh.last_refreshed_at = Some(Utc::now());
        state
    }

    #[test]
    fn test_leaderboard_row_marks_pulse_and_badge() {
        let snapshot = Snapshot::build((), vec![entry(1, "Ann", "-3")], None);
        let row = leaderboard_row(
            &snapshot.entries()[0],
            RowCue {
                badge: RankBadge::Gold,
                pulsing: true,
            },
        );
        assert!(row.starts_with('*'));
        assert!(row.contains("🥇"));
        assert!(row.contains("Ann"));
    }

    #[tokio::test]
    async fn test_render_leaderboard() {
        let out = render_leaderboard(&ready_state(), Duration::from_secs(2), Utc::now());
        assert!(out.contains("Tournament - Stroke leaderboard"));
        assert!(out.contains("Ben"));
        assert!(out.contains("Live, updated"));
    }

    #[test]
    fn test_status_line_loading() {
        let state: ViewState<LeaderboardEntry> = ViewState::new(true, FailurePolicy::KeepStale);
        assert_eq!(status_line(&state, Utc::now()), "Loading...");
    }

    #[test]
    fn test_status_line_blocking_failure_offers_retry() {
        let mut state: ViewState<LeaderboardEntry> = ViewState::new(false, FailurePolicy::Block);
        state.status = ViewStatus::Unavailable {
            error: ApiError::Timeout,
            parent: Some("/admin".to_string()),
        };
        let line = status_line(&state, Utc::now());
        assert!(line.contains("Press r to retry or go back to /admin"));
        assert!(line.ends_with("[auto refresh off]"));
    }

    #[tokio::test]
    async fn test_status_line_stale() {
        let mut state = ready_state();
        state.status = ViewStatus::Unavailable {
            error: ApiError::Network("refused".into()),
            parent: None,
        };
        let line = status_line(&state, Utc::now());
        assert!(line.starts_with("Unavailable (Unable to reach the server"));
        assert!(line.contains("showing data updated"));
    }

    #[test]
    fn test_desk_row_marks() {
        let row = desk_row(&desk(12, "Ann", false, None));
        assert!(row.starts_with(" [ ]"));
        assert!(row.contains("    12  Ann"));
        assert!(row.contains("ann@example.com"));
        assert!(row.ends_with("Confirmed/Paid"));

        let mut pending = desk(3, "Bob", true, Some(SyncState::Pending));
        pending.pulsing = true;
        let row = desk_row(&pending);
        assert!(row.starts_with("*[x]"));
        assert!(row.ends_with(" (saving)"));

        let failed = desk_row(&desk(4, "Cal", true, Some(SyncState::Failed)));
        assert!(failed.ends_with(" (not saved)"));

        let confirmed = desk_row(&desk(5, "Dee", true, Some(SyncState::Confirmed)));
        assert!(confirmed.ends_with("Confirmed/Paid"));
    }

    #[test]
    fn test_render_desk_summary_and_notices() {
        let rows = vec![desk(1, "Ann", true, None), desk(2, "Bob", false, None)];
        let filter = FilterState::new("a", CheckInFilter::All);
        let notices = vec![
            notice(NoticeLevel::Success, "Checked in Ann"),
            notice(NoticeLevel::Error, "Golfer 9 is not on this roster"),
        ];

        let out = render_desk(&rows, 5, &filter, &notices, "Live");
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines[0],
            "Check-in: showing 2 of 5 (1 checked in) | filter: all | search: \"a\""
        );
        assert!(lines[1].contains("Ann"));
        assert!(lines[2].contains("Bob"));
        assert_eq!(lines[3], "✓ Checked in Ann");
        assert_eq!(lines[4], "✕ Golfer 9 is not on this roster");
        assert_eq!(lines[5], "Live");
        assert!(lines[6].starts_with("type to search"));
        assert!(!out.contains("No golfers match"));
    }

    #[test]
    fn test_render_desk_empty_match() {
        let filter = FilterState::new("zed", CheckInFilter::NotCheckedIn);
        let out = render_desk(&[], 3, &filter, &[], "Live");
        assert!(out.contains("showing 0 of 3 (0 checked in) | filter: not checked in"));
        assert!(out.contains("  No golfers match"));

        // An empty roster is not a filter miss
        let out = render_desk(&[], 0, &FilterState::default(), &[], "Loading...");
        assert!(!out.contains("No golfers match"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
