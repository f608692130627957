//! In-process fake of the tournament API

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fairway::{ApiClient, ClientConfig, Environment, Session};

pub const TOKEN: &str = "staff-token";

pub struct FakeApi {
    /// Bumped by tests to change the leaderboard between polls
    pub leaderboard_round: AtomicUsize,
    pub fail_raffle: AtomicBool,
    pub checked_in: Mutex<HashMap<u64, String>>,
    pub actions: AtomicUsize,
    pub request_ids: Mutex<Vec<String>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        let mut checked_in = HashMap::new();
        checked_in.insert(2, "2026-05-01T07:45:00Z".to_string());

        Self {
            leaderboard_round: AtomicUsize::new(0),
            fail_raffle: AtomicBool::new(false),
            checked_in: Mutex::new(checked_in),
            actions: AtomicUsize::new(0),
            request_ids: Mutex::new(Vec::new()),
        }
    }
}

type Shared = Arc<FakeApi>;

/// Serve the fake on an ephemeral port; returns its base URL
pub async fn spawn(api: Shared) -> String {
    let app = Router::new()
        .route("/api/v1/tournaments/:id/scores/leaderboard", get(leaderboard))
        .route("/api/v1/tournaments/:id/raffle/board", get(raffle))
        .route(
            "/api/v1/admin/organizations/:org/tournaments/:tournament",
            get(roster),
        )
        .route("/api/v1/golfers/:id/check_in", post(check_in))
        .route("/api/v1/golfers/:id/undo_check_in", post(undo_check_in))
        .with_state(api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

pub fn client(base_url: &str) -> Arc<ApiClient> {
    Arc::new(
        ApiClient::new(ClientConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 2_000,
        })
        .unwrap(),
    )
}

pub async fn staff_session() -> Session {
    let session = Session::anonymous(Environment::Development);
    session.login(TOKEN).await.unwrap();
    session
}

fn record(api: &FakeApi, headers: &HeaderMap) {
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        api.request_ids.lock().unwrap().push(id.to_string());
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn leaderboard(
    State(api): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record(&api, &headers);
    if id == "missing" {
        return error(StatusCode::NOT_FOUND, json!({"error": "Tournament not found"}));
    }

    let round = api.leaderboard_round.load(Ordering::SeqCst) as i32;
    Json(json!({
        "tournament": {"id": 7, "name": "Spring Scramble", "slug": id},
        "scoring_type": "stroke",
        "leaderboard": [
            {"position": 1, "name": "Ann", "total_strokes": 67 - round, "total_relative": -5 - round, "thru": 18},
            {"position": 2, "name": "Ben", "total_strokes": 70, "total_relative": -2, "thru": 16},
            {"position": 3, "name": "Cal", "total_strokes": 72, "total_relative": 0, "thru": "F"}
        ]
    }))
    .into_response()
}

async fn raffle(State(api): State<Shared>, headers: HeaderMap) -> Response {
    record(&api, &headers);
    if api.fail_raffle.load(Ordering::SeqCst) {
        return error(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Raffle temporarily unavailable"}),
        );
    }

    Json(json!({
        "tournament": {"id": 7, "name": "Spring Scramble"},
        "prizes": [
            {"id": 1, "name": "Driver", "tier": "grand", "won": true, "winner": {"name": "Ann", "ticket_number": "0042"}},
            {"id": 2, "name": "Golf Balls", "tier": "standard", "won": false}
        ],
        "stats": {"total_prizes": 2, "prizes_won": 1, "prizes_remaining": 1, "tickets_sold": 120}
    }))
    .into_response()
}

async fn roster(
    State(api): State<Shared>,
    Path((_org, tournament)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    record(&api, &headers);
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, json!({"error": "Invalid token"}));
    }

    let checked_in = api.checked_in.lock().unwrap().clone();
    let golfer = |id: u64, name: &str, email: &str| {
        json!({
            "id": id,
            "name": name,
            "email": email,
            "registration_status": "confirmed",
            "payment_status": "paid",
            "checked_in_at": checked_in.get(&id),
        })
    };

    Json(json!({
        "tournament": {"id": 7, "name": "Spring Scramble", "slug": tournament},
        "golfers": [
            golfer(1, "Alice Moss", "alice@example.com"),
            golfer(2, "Bob Reed", "bob@example.com"),
            golfer(3, "Carol Park", "carol@clubmail.org"),
        ]
    }))
    .into_response()
}

async fn check_in(
    State(api): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    record(&api, &headers);
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, json!({"error": "Invalid token"}));
    }
    api.actions.fetch_add(1, Ordering::SeqCst);

    if id > 3 {
        return error(StatusCode::NOT_FOUND, json!({"error": "Golfer not found"}));
    }

    let mut checked_in = api.checked_in.lock().unwrap();
    if checked_in.contains_key(&id) {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"error": "Golfer is already checked in", "already_checked_in": true}),
        );
    }
    checked_in.insert(id, "2026-05-01T08:00:00Z".to_string());
    Json(json!({"id": id, "checked_in_at": "2026-05-01T08:00:00Z"})).into_response()
}

async fn undo_check_in(
    State(api): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    record(&api, &headers);
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, json!({"error": "Invalid token"}));
    }
    api.actions.fetch_add(1, Ordering::SeqCst);

    api.checked_in.lock().unwrap().remove(&id);
    StatusCode::NO_CONTENT.into_response()
}
