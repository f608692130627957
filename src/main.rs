//! Fairway CLI
//!
//! Terminal front-end for the tournament API:
//! - Watch a live leaderboard or raffle board
//! - Run the staff check-in desk
//! - Check a golfer in or out
//! - Generate a default config file

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fairway::checkin::{AdminRoster, CheckInDesk, DeskCommand};
use fairway::config::{generate_default_config, Config, LoggingConfig};
use fairway::leaderboard::LeaderboardSource;
use fairway::poll::{PollingView, RankedItem, SnapshotSource, ViewConfig, ViewState, ViewStatus};
use fairway::raffle::RaffleSource;
use fairway::{render, ApiClient, ApiError, ApiResult};

#[derive(Parser)]
#[command(name = "fairway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live leaderboards, raffle boards and check-in for golf tournaments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Fetch once and exit instead of polling
    #[arg(long, global = true)]
    pub once: bool,

    /// Refresh interval in seconds (overrides config)
    #[arg(short, long, global = true)]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Output options shared by the watch commands
#[derive(Debug, Clone, Copy)]
struct Output {
    format: OutputFormat,
    once: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch a tournament leaderboard
    Leaderboard {
        /// Tournament id or slug
        tournament: String,
    },

    /// Watch a tournament raffle board
    Raffle {
        /// Tournament id or slug
        tournament: String,
    },

    /// Run the check-in desk for a tournament
    Checkin {
        /// Organization slug
        org: String,
        /// Tournament slug
        tournament: String,
    },

    /// Check a golfer in
    CheckIn {
        /// Golfer id
        golfer: u64,
    },

    /// Undo a golfer's check-in
    UndoCheckIn {
        /// Golfer id
        golfer: u64,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let report = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    let mut config = report.config.clone();
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }

    init_logging(&config.logging);
    report.log();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let client = Arc::new(ApiClient::new(config.api.client_config())?);
    let output = Output {
        format: cli.format,
        once: cli.once,
    };
    let interval = cli.interval.map(Duration::from_secs);
    let with_interval = |view: ViewConfig| match interval {
        Some(interval) => ViewConfig { interval, ..view },
        None => view,
    };

    match cli.command {
        Commands::Leaderboard { tournament } => {
            let source = LeaderboardSource::new(client, tournament);
            let view_config = with_interval(config.polling.leaderboard_view());
            run_board(source, view_config, output, render::render_leaderboard).await
        }

        Commands::Raffle { tournament } => {
            let source = RaffleSource::new(client, tournament);
            let view_config = with_interval(config.polling.raffle_view());
            run_board(source, view_config, output, render::render_raffle).await
        }

        Commands::Checkin { org, tournament } => {
            let session = config.session.open().await?;
            if !session.is_authenticated().await {
                tracing::warn!("No session token configured; roster requests will be rejected");
            }
            let roster = AdminRoster::new(client, session, org, tournament);
            let mut view_config =
                with_interval(config.polling.checkin_view()).parent(roster.parent_context());
            if output.once {
                view_config = view_config.manual_only();
            }
            let desk = Arc::new(CheckInDesk::open(
                roster,
                view_config,
                config.checkin.rollback_on_failure,
            ));
            run_desk(desk, output).await
        }

        Commands::CheckIn { golfer } => {
            let session = config.session.open().await?;
            report_action(client.check_in(golfer, &session).await, "Checked in", golfer)
        }

        Commands::UndoCheckIn { golfer } => {
            let session = config.session.open().await?;
            report_action(
                client.undo_check_in(golfer, &session).await,
                "Undid check-in for",
                golfer,
            )
        }

        Commands::Config { .. } => Ok(()),
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fairway={}", logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is the rendered view; logs go to stderr
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn report_action(result: ApiResult<()>, verb: &str, golfer: u64) -> anyhow::Result<()> {
    match result {
        Ok(()) => {
            println!("{} golfer {}", verb, golfer);
            Ok(())
        }
        Err(ApiError::AlreadyCompleted(message)) => {
            println!("{}", message);
            Ok(())
        }
        Err(e) => bail!("{}", e.user_message()),
    }
}

// ============================================
// Live boards
// ============================================

type RenderFn<S> = fn(
    &ViewState<<S as SnapshotSource>::Item, <S as SnapshotSource>::Meta>,
    Duration,
    DateTime<Utc>,
) -> String;

async fn run_board<S>(
    source: S,
    view_config: ViewConfig,
    output: Output,
    render_state: RenderFn<S>,
) -> anyhow::Result<()>
where
    S: SnapshotSource,
    S::Item: Serialize,
{
    let view_config = if output.once {
        view_config.manual_only()
    } else {
        view_config
    };
    let view = PollingView::mount(source, view_config);

    if output.once {
        let state = first_load(&view).await?;
        match output.format {
            OutputFormat::Table => print!("{}", render_state(&state, view.highlight(), Utc::now())),
            OutputFormat::Json => println!("{}", board_json(&state)?),
        }
        return match state.status {
            ViewStatus::Unavailable { error, .. } => Err(error.into()),
            _ => Ok(()),
        };
    }

    let mut updates = view.subscribe();
    let mut redraw = tokio::time::interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let mut changed = false;
        tokio::select! {
            result = updates.changed() => {
                if result.is_err() {
                    break;
                }
                changed = true;
            }
            _ = redraw.tick() => {}
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match line.trim() {
                    "q" | "/q" => break,
                    "r" => {
                        let _ = view.trigger_refresh();
                    }
                    "p" => {
                        let enabled = view.state().await.refresh.auto_refresh_enabled;
                        view.set_auto_refresh(!enabled).await;
                    }
                    _ => {}
                },
                None => stdin_open = false,
            },
            _ = &mut shutdown => break,
        }

        let state = view.state().await;
        match output.format {
            OutputFormat::Table => {
                clear_screen();
                print!("{}", render_state(&state, view.highlight(), Utc::now()));
                println!("r: refresh | p: pause/resume | q: quit");
            }
            OutputFormat::Json if changed && !state.is_loading() => {
                println!("{}", board_json(&state)?)
            }
            OutputFormat::Json => {}
        }
        std::io::stdout().flush()?;
    }

    view.unmount();
    Ok(())
}

/// Wait until the first fetch after mount has resolved
async fn first_load<S: SnapshotSource>(
    view: &PollingView<S>,
) -> anyhow::Result<ViewState<S::Item, S::Meta>> {
    let mut updates = view.subscribe();
    loop {
        let state = view.state().await;
        if !state.is_loading() {
            return Ok(state);
        }
        updates.changed().await?;
    }
}

fn board_json<T: RankedItem + Serialize, M>(state: &ViewState<T, M>) -> anyhow::Result<String> {
    let entries: Vec<_> = state
        .visible()
        .map(|snapshot| {
            snapshot
                .entries()
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "position": e.position,
                        "identity": e.identity,
                        "changed": e.changed,
                        "item": e.item,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(serde_json::to_string(&serde_json::json!({
        "refreshed_at": state.refresh.last_refreshed_at,
        "error": state.error().map(|e| e.to_string()),
        "entries": entries,
    }))?)
}

fn clear_screen() {
    print!("\x1B[2J\x1B[H");
}

// ============================================
// Check-in desk
// ============================================

async fn run_desk(desk: Arc<CheckInDesk<AdminRoster>>, output: Output) -> anyhow::Result<()> {
    if output.once {
        let state = first_load(desk.view()).await?;
        if let ViewStatus::Unavailable { error, .. } = state.status {
            return Err(error.into());
        }
        let rows = desk.rows().await;
        match output.format {
            OutputFormat::Table => {
                for row in &rows {
                    println!("{}", render::desk_row(row));
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string(&rows)?),
        }
        return Ok(());
    }

    let mut updates = desk.view().subscribe();
    let mut redraw = tokio::time::interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = updates.changed() => {
                if result.is_err() {
                    break;
                }
            }
            _ = redraw.tick() => {}
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    if !handle_desk_input(&desk, &line).await {
                        break;
                    }
                }
                None => stdin_open = false,
            },
            _ = &mut shutdown => break,
        }

        draw_desk(&desk, output.format).await?;
    }

    Ok(())
}

/// Apply one line of desk input; returns false to quit
async fn handle_desk_input(desk: &Arc<CheckInDesk<AdminRoster>>, line: &str) -> bool {
    let command = match line.parse::<DeskCommand>() {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!(input = line.trim(), "{}", e);
            return true;
        }
    };

    match command {
        DeskCommand::Quit => return false,
        DeskCommand::QuickCommit => {
            let desk = Arc::clone(desk);
            tokio::spawn(async move {
                if desk.quick_commit().await.is_none() {
                    tracing::debug!("Enter ignored: no single unchecked match");
                }
            });
        }
        DeskCommand::Refresh => {
            let _ = desk.view().trigger_refresh();
        }
        DeskCommand::Filter(category) => desk.set_category(category).await,
        DeskCommand::CheckIn(golfer_id) => {
            let desk = Arc::clone(desk);
            tokio::spawn(async move {
                desk.check_in(golfer_id).await;
            });
        }
        DeskCommand::Undo(golfer_id) => {
            let desk = Arc::clone(desk);
            tokio::spawn(async move {
                desk.undo_check_in(golfer_id).await;
            });
        }
        DeskCommand::Search(search) => desk.set_search(search).await,
    }
    true
}

async fn draw_desk(desk: &CheckInDesk<AdminRoster>, format: OutputFormat) -> anyhow::Result<()> {
    let state = desk.view().state().await;
    let rows = desk.rows().await;

    match format {
        OutputFormat::Table => {
            let total = state.visible().map(|s| s.len()).unwrap_or(0);
            let filter = desk.filter().await;
            let notices = desk.notices().await;
            let status = render::status_line(&state, Utc::now());
            clear_screen();
            print!(
                "{}",
                render::render_desk(&rows, total, &filter, &notices, &status)
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(&rows)?),
    }
    std::io::stdout().flush()?;
    Ok(())
}
