//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ClientConfig;
use crate::poll::ViewConfig;
use crate::session::{Environment, Session, SessionResult};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub checkin: CheckInConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Tournament API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_ms: self.request_timeout_secs.saturating_mul(1000),
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Developer bypass token; ignored in production
    #[serde(default)]
    pub dev_token: Option<String>,

    /// Identity provider token for admin calls
    #[serde(default)]
    pub token: Option<String>,
}

impl SessionConfig {
    /// Start a session from the configured credential, preferring the provider token
    pub async fn open(&self) -> SessionResult<Session> {
        let session = Session::anonymous(self.environment);
        if let Some(token) = &self.token {
            session.login(token.as_str()).await?;
        } else if let Some(token) = &self.dev_token {
            session.dev_login(token.as_str()).await?;
        }
        Ok(session)
    }
}

/// Refresh intervals for the live views
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_leaderboard_interval")]
    pub leaderboard_interval_secs: u64,

    #[serde(default = "default_raffle_interval")]
    pub raffle_interval_secs: u64,

    #[serde(default = "default_checkin_interval")]
    pub checkin_interval_secs: u64,

    #[serde(default = "default_highlight")]
    pub highlight_ms: u64,
}

fn default_leaderboard_interval() -> u64 {
    30
}

fn default_raffle_interval() -> u64 {
    10
}

fn default_checkin_interval() -> u64 {
    30
}

fn default_highlight() -> u64 {
    2000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            leaderboard_interval_secs: default_leaderboard_interval(),
            raffle_interval_secs: default_raffle_interval(),
            checkin_interval_secs: default_checkin_interval(),
            highlight_ms: default_highlight(),
        }
    }
}

impl PollingConfig {
    fn view(&self, interval_secs: u64) -> ViewConfig {
        ViewConfig::every(Duration::from_secs(interval_secs))
            .highlight(Duration::from_millis(self.highlight_ms))
    }

    pub fn leaderboard_view(&self) -> ViewConfig {
        self.view(self.leaderboard_interval_secs)
    }

    pub fn raffle_view(&self) -> ViewConfig {
        self.view(self.raffle_interval_secs)
    }

    pub fn checkin_view(&self) -> ViewConfig {
        self.view(self.checkin_interval_secs)
    }
}

/// Check-in desk behavior
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckInConfig {
    /// Revert an optimistic check-in when the server rejects it
    #[serde(default)]
    pub rollback_on_failure: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> ConfigResult<LoadReport> {
        let mut config = Self::load(path)?;
        let problems = config.apply_env_overrides();
        Ok(LoadReport {
            config,
            source: Some(path.to_path_buf()),
            problems,
        })
    }

    /// Load from default locations or environment
    pub fn load_default() -> LoadReport {
        Self::search(&default_paths())
    }

    /// First readable file among `paths`, with env overrides on top
    fn search(paths: &[PathBuf]) -> LoadReport {
        let mut problems = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(mut report) => {
                    problems.append(&mut report.problems);
                    report.problems = problems;
                    return report;
                }
                Err(e) => problems.push(e.to_string()),
            }
        }

        let mut config = Config::default();
        problems.extend(config.apply_env_overrides());
        LoadReport {
            config,
            source: None,
            problems,
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Returns a message for every override that was ignored
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let mut problems = Vec::new();

        // API overrides
        if let Some(url) = var("FAIRWAY_API_URL") {
            self.api.base_url = url;
        }
        if let Some(timeout) = var("FAIRWAY_API_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(t) => self.api.request_timeout_secs = t,
                Err(_) => problems.push(format!(
                    "Ignoring FAIRWAY_API_TIMEOUT_SECS: {:?} is not a number of seconds",
                    timeout
                )),
            }
        }

        // Session overrides
        if let Some(env) = var("FAIRWAY_ENVIRONMENT") {
            match env.parse() {
                Ok(e) => self.session.environment = e,
                Err(e) => problems.push(format!("Ignoring FAIRWAY_ENVIRONMENT: {}", e)),
            }
        }
        if let Some(token) = var("FAIRWAY_TOKEN") {
            self.session.token = Some(token);
        }
        if let Some(token) = var("FAIRWAY_DEV_TOKEN") {
            self.session.dev_token = Some(token);
        }

        // Logging overrides
        if let Some(level) = var("FAIRWAY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("FAIRWAY_LOG_FORMAT") {
            self.logging.format = format;
        }

        problems
    }
}

/// Config search order when no path is given
pub fn default_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("fairway").join("config.toml")),
        Some(PathBuf::from("/etc/fairway/config.toml")),
        Some(PathBuf::from("./config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// A loaded config, where it came from, and anything skipped on the way
///
/// Loading happens before logging is set up, so problems are collected here
/// and reported once the subscriber exists.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub config: Config,
    /// File the config came from; `None` means defaults
    pub source: Option<PathBuf>,
    pub problems: Vec<String>,
}

impl LoadReport {
    /// Emit the load outcome through the installed subscriber
    pub fn log(&self) {
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::debug!("Using default config with environment overrides"),
        }
        for problem in &self.problems {
            tracing::warn!("{}", problem);
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Fairway Configuration
#
# Environment variables override these settings:
# - FAIRWAY_API_URL
# - FAIRWAY_API_TIMEOUT_SECS
# - FAIRWAY_ENVIRONMENT
# - FAIRWAY_TOKEN
# - FAIRWAY_DEV_TOKEN
# - FAIRWAY_LOG_LEVEL
# - FAIRWAY_LOG_FORMAT

[api]
# Tournament API host
base_url = "http://localhost:3000"

# Request timeout in seconds
request_timeout_secs = 10

[session]
# development, staging or production
environment = "development"

# Identity provider token for admin calls (check-in)
# token = ""

# Developer bypass token, ignored in production
# dev_token = ""

[polling]
# Refresh intervals (seconds)
leaderboard_interval_secs = 30
raffle_interval_secs = 10
checkin_interval_secs = 30

# How long a changed row stays highlighted (ms)
highlight_ms = 2000

[checkin]
# Revert an optimistic check-in when the server rejects it
rollback_on_failure = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
