//! Tournament API Client
//!
//! HTTP client for the tournament management JSON API. Public boards need
//! no credentials; admin calls take the [`Session`] explicitly.

mod endpoint;
mod error;

pub use endpoint::{Endpoint, API_PREFIX};
pub use error::{ApiError, ApiResult};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use crate::checkin::RosterResponse;
use crate::leaderboard::LeaderboardResponse;
use crate::raffle::RaffleBoard;
use crate::session::Session;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API host (e.g., "http://localhost:3000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

/// Tournament API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("fairway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for an endpoint
    pub fn url(&self, endpoint: &Endpoint) -> ApiResult<String> {
        Ok(format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.path()?
        ))
    }

    /// Fetch the public leaderboard for a tournament
    pub async fn leaderboard(&self, tournament_id: &str) -> ApiResult<LeaderboardResponse> {
        self.get_json(&Endpoint::leaderboard(tournament_id), None).await
    }

    /// Fetch the public raffle board for a tournament
    pub async fn raffle_board(&self, tournament_id: &str) -> ApiResult<RaffleBoard> {
        self.get_json(&Endpoint::raffle_board(tournament_id), None).await
    }

    /// Fetch the admin view of a tournament with its golfer roster
    pub async fn tournament_roster(
        &self,
        org_slug: &str,
        tournament_slug: &str,
        session: &Session,
    ) -> ApiResult<RosterResponse> {
        self.get_json(
            &Endpoint::admin_tournament(org_slug, tournament_slug),
            Some(session),
        )
        .await
    }

    /// Check a golfer in
    pub async fn check_in(&self, golfer_id: u64, session: &Session) -> ApiResult<()> {
        validate_id(golfer_id)?;
        self.send_empty(&Endpoint::check_in(golfer_id), Some(session))
            .await
    }

    /// Undo a golfer's check-in
    pub async fn undo_check_in(&self, golfer_id: u64, session: &Session) -> ApiResult<()> {
        validate_id(golfer_id)?;
        self.send_empty(&Endpoint::undo_check_in(golfer_id), Some(session))
            .await
    }

    /// Send a request and decode its JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        session: Option<&Session>,
    ) -> ApiResult<T> {
        let text = self.execute(endpoint, session).await?;
        serde_json::from_str(&text).map_err(ApiError::from)
    }

    /// Send a request whose success body is irrelevant
    async fn send_empty(&self, endpoint: &Endpoint, session: Option<&Session>) -> ApiResult<()> {
        self.execute(endpoint, session).await.map(|_| ())
    }

    async fn execute(&self, endpoint: &Endpoint, session: Option<&Session>) -> ApiResult<String> {
        let url = self.url(endpoint)?;
        let request_id = uuid::Uuid::new_v4().to_string();
        let request = self.authorize(
            self.client
                .request(endpoint.method().clone(), &url)
                .header(REQUEST_ID_HEADER, &request_id),
            endpoint,
            session,
        )
        .await?;

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            tracing::warn!(request_id = %request_id, url = %url, error = %e, "Request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::from)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            tracing::debug!(
                request_id = %request_id,
                method = %endpoint.method(),
                url = %url,
                status = status.as_u16(),
                elapsed_ms,
                "Request completed"
            );
            Ok(body)
        } else {
            let error = ApiError::from_response(status.as_u16(), &body);
            tracing::warn!(
                request_id = %request_id,
                method = %endpoint.method(),
                url = %url,
                status = status.as_u16(),
                elapsed_ms,
                error = %error,
                "Request rejected"
            );
            Err(error)
        }
    }

    async fn authorize(
        &self,
        request: RequestBuilder,
        endpoint: &Endpoint,
        session: Option<&Session>,
    ) -> ApiResult<RequestBuilder> {
        if !endpoint.requires_auth() {
            return Ok(request);
        }

        let token = match session {
            Some(session) => session.bearer().await,
            None => None,
        };

        token
            .map(|t| request.bearer_auth(t))
            .ok_or_else(|| ApiError::Unauthorized("No active session".to_string()))
    }
}

fn validate_id(id: u64) -> ApiResult<()> {
    if id == 0 {
        Err(ApiError::Validation("Golfer id must be positive".to_string()))
    } else {
        Ok(())
    }
}
