// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing,
    Form, Json, Router,
};
use serde_json::{json, Value};
use statcard::card::CardRenderer;
use statcard::config::Config;
use statcard::db::FirestoreDb;
use statcard::middleware::auth::create_jwt;
use statcard::models::UserTokens;
use statcard::routes::create_router;
use statcard::time_utils::unix_now;
use statcard::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ATHLETE_ID: u64 = 4242;
pub const GOOD_CODE: &str = "good-code";
pub const GOOD_REFRESH: &str = "refresh-ok";
pub const MISSING_ACTIVITY: u64 = 404_404;

/// Config pointing Strava at an address nothing listens on.
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::test_default();
    config.strava_api_url = "http://127.0.0.1:9/api".to_string();
    config.strava_oauth_url = "http://127.0.0.1:9/oauth".to_string();
    config
}

/// Create a test app with an in-memory store and no fonts.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(test_config())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = test_config();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        config,
        FirestoreDb::new_memory(),
        CardRenderer::without_fonts(),
    ));
    (create_router(state.clone()), state)
}

/// App wired to a fresh mock Strava server.
#[allow(dead_code)]
pub async fn create_test_app_with_mock_strava() -> (axum::Router, Arc<AppState>, MockStrava) {
    let mock = MockStrava::spawn().await;
    let mut config = test_config();
    config.strava_api_url = format!("{}/api", mock.url);
    config.strava_oauth_url = format!("{}/oauth", mock.url);
    let (app, state) = create_test_app_with_config(config);
    (app, state, mock)
}

#[allow(dead_code)]
pub fn create_test_jwt(athlete_id: u64) -> String {
    create_jwt(athlete_id, &Config::test_default().jwt_signing_key).unwrap()
}

#[allow(dead_code)]
pub fn session_cookie(athlete_id: u64) -> String {
    format!("statcard_session={}", create_test_jwt(athlete_id))
}

/// Store a token pair expiring `expires_in` seconds from now.
#[allow(dead_code)]
pub async fn store_tokens(state: &AppState, athlete_id: u64, access: &str, expires_in: i64) {
    state
        .db
        .set_tokens(
            athlete_id,
            &UserTokens {
                access_token: access.to_string(),
                refresh_token: GOOD_REFRESH.to_string(),
                expires_at: unix_now() + expires_in,
                scopes: vec!["read".to_string()],
            },
        )
        .await
        .unwrap();
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[allow(dead_code)]
pub fn get(uri: &str, cookie: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub fn post_json(uri: &str, cookie: &str, body: Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Strava-shaped activity JSON.
#[allow(dead_code)]
pub fn activity_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": "Morning Ride",
        "distance": 42195.0,
        "moving_time": 5100,
        "elapsed_time": 5400,
        "total_elevation_gain": 411.8,
        "type": "Ride",
        "sport_type": "Ride",
        "start_date": "2026-10-18T14:12:45Z",
        "start_date_local": "2026-10-18T07:12:45Z",
        "map": { "summary_polyline": "_p~iF~ps|U_ulLnnqC_mqNvxq`@" },
        "average_speed": 8.27,
        "max_speed": 15.0,
        "average_watts": 187.6,
        "average_heartrate": 141.8,
        "max_heartrate": 171.0
    })
}

// ─── Mock Strava ─────────────────────────────────────────────

/// Local stand-in for Strava's OAuth and REST endpoints.
#[derive(Clone)]
pub struct MockStrava {
    pub url: String,
    pub counters: Arc<MockCounters>,
}

#[derive(Default)]
pub struct MockCounters {
    pub exchanges: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub lists: AtomicUsize,
    pub details: AtomicUsize,
    pub deauthorizations: AtomicUsize,
    /// Make the activity list endpoint answer 500.
    pub fail_lists: AtomicBool,
    /// Bearer token of the last REST call.
    pub last_bearer: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl MockStrava {
    pub async fn spawn() -> Self {
        let counters = Arc::new(MockCounters::default());

        let app = Router::new()
            .route("/oauth/token", routing::post(token))
            .route("/oauth/deauthorize", routing::post(deauthorize))
            .route("/api/athlete/activities", routing::get(list_activities))
            .route("/api/activities/{id}", routing::get(get_activity))
            .with_state(counters.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            counters,
        }
    }

    pub fn refreshes(&self) -> usize {
        self.counters.refreshes.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.counters.lists.load(Ordering::SeqCst)
    }

    pub fn details(&self) -> usize {
        self.counters.details.load(Ordering::SeqCst)
    }

    pub fn deauthorizations(&self) -> usize {
        self.counters.deauthorizations.load(Ordering::SeqCst)
    }

    pub fn last_bearer(&self) -> Option<String> {
        self.counters.last_bearer.lock().unwrap().clone()
    }
}

fn bad_request(code: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Bad Request", "errors": [{ "code": code }] })),
    )
        .into_response()
}

async fn token(
    State(counters): State<Arc<MockCounters>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            counters.exchanges.fetch_add(1, Ordering::SeqCst);
            if form.get("code").map(String::as_str) != Some(GOOD_CODE) {
                return bad_request("invalid");
            }
            Json(json!({
                "token_type": "Bearer",
                "access_token": "access-initial",
                "refresh_token": GOOD_REFRESH,
                "expires_at": unix_now() + 6 * 3600,
                "athlete": {
                    "id": ATHLETE_ID,
                    "firstname": "Ada",
                    "lastname": "Lovelace",
                    "profile": "https://example.com/ada.jpg"
                }
            }))
            .into_response()
        }
        Some("refresh_token") => {
            let n = counters.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            if form.get("refresh_token").map(String::as_str) != Some(GOOD_REFRESH) {
                return bad_request("invalid_grant");
            }
            Json(json!({
                "token_type": "Bearer",
                "access_token": format!("access-refreshed-{n}"),
                "refresh_token": GOOD_REFRESH,
                "expires_at": unix_now() + 6 * 3600
            }))
            .into_response()
        }
        _ => bad_request("grant_type"),
    }
}

async fn deauthorize(State(counters): State<Arc<MockCounters>>) -> Response {
    counters.deauthorizations.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "access_token": "revoked" })).into_response()
}

/// Accept only tokens the mock handed out.
fn authorize(counters: &MockCounters, headers: &HeaderMap) -> Result<(), Response> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);
    *counters.last_bearer.lock().unwrap() = bearer.clone();

    match bearer {
        Some(token) if token.starts_with("access-") => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Authorization Error" })),
        )
            .into_response()),
    }
}

async fn list_activities(State(counters): State<Arc<MockCounters>>, headers: HeaderMap) -> Response {
    counters.lists.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = authorize(&counters, &headers) {
        return response;
    }
    if counters.fail_lists.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }
    Json(json!([activity_json(1001), activity_json(1002)])).into_response()
}

async fn get_activity(
    State(counters): State<Arc<MockCounters>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    counters.details.fetch_add(1, Ordering::SeqCst);
    if let Err(response) = authorize(&counters, &headers) {
        return response;
    }
    if id == MISSING_ACTIVITY {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Record Not Found" })),
        )
            .into_response();
    }
    Json(activity_json(id)).into_response()
}
