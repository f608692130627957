//! Session Context
//!
//! Holds the bearer credential used for admin-scoped API calls. The session
//! is an explicit object handed to the client, never ambient storage: it is
//! initialised by a login, torn down by a logout, and shared between views
//! through an `Arc`.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Deployment environment the client runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn allows_dev_bypass(self) -> bool {
        self != Environment::Production
    }
}

impl std::str::FromStr for Environment {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(SessionError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Where the current bearer token came from
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Token issued by the identity provider
    Provider(String),
    /// Developer-only bypass token
    DevBypass(String),
}

impl Credential {
    pub fn token(&self) -> &str {
        match self {
            Credential::Provider(t) | Credential::DevBypass(t) => t,
        }
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Provider(_) => f.write_str("Provider(***)"),
            Credential::DevBypass(_) => f.write_str("DevBypass(***)"),
        }
    }
}

/// Session lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Developer bypass login is disabled in production")]
    DevBypassDisabled,

    #[error("Token must not be empty")]
    EmptyToken,

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Auth context passed to API-calling code
#[derive(Debug, Clone)]
pub struct Session {
    environment: Environment,
    credential: Arc<RwLock<Option<Credential>>>,
}

impl Session {
    /// A session with no credential
    pub fn anonymous(environment: Environment) -> Self {
        Self {
            environment,
            credential: Arc::new(RwLock::new(None)),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Store a provider-issued token
    pub async fn login(&self, token: impl Into<String>) -> SessionResult<()> {
        let token = non_empty(token.into())?;
        *self.credential.write().await = Some(Credential::Provider(token));
        tracing::info!("Session started");
        Ok(())
    }

    /// Store a developer bypass token (non-production builds only)
    pub async fn dev_login(&self, token: impl Into<String>) -> SessionResult<()> {
        if !self.environment.allows_dev_bypass() {
            tracing::warn!("Rejected developer bypass login in production");
            return Err(SessionError::DevBypassDisabled);
        }
        let token = non_empty(token.into())?;
        *self.credential.write().await = Some(Credential::DevBypass(token));
        tracing::info!(environment = ?self.environment, "Developer bypass session started");
        Ok(())
    }

    /// Drop the credential
    pub async fn logout(&self) {
        if self.credential.write().await.take().is_some() {
            tracing::info!("Session ended");
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Current bearer token, if any
    pub async fn bearer(&self) -> Option<String> {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|c| c.token().to_string())
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }
}

fn non_empty(token: String) -> SessionResult<String> {
    let token = token.trim().to_string();
    if token.is_empty() {
        Err(SessionError::EmptyToken)
    } else {
        Ok(token)
    }
}
