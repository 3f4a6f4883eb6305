// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ActivitySummary, StravaActivity};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/activities", get(get_activities))
        .route("/api/activities/{id}", get(get_activity))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub athlete_id: u64,
    pub firstname: String,
    pub lastname: String,
    pub display_name: String,
    pub profile_picture: Option<String>,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(user.athlete_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.athlete_id)))?;

    Ok(Json(UserResponse {
        athlete_id: profile.strava_athlete_id,
        display_name: profile.display_name(),
        firstname: profile.firstname,
        lastname: profile.lastname,
        profile_picture: profile.profile_picture,
    }))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivitySummary>,
}

/// Dashboard list. An upstream failure shows up as an empty list.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<ActivitiesResponse> {
    let now = chrono::Utc::now();
    let activities = state
        .strava_service
        .recent_activities(user.athlete_id)
        .await
        .iter()
        .map(|a| ActivitySummary::from_activity(a, now))
        .collect();

    Json(ActivitiesResponse { activities })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityDetailResponse {
    /// Activity exactly as Strava returned it
    pub activity: StravaActivity,
    pub summary: ActivitySummary,
}

async fn get_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
) -> Result<Json<ActivityDetailResponse>> {
    let activity = state
        .strava_service
        .get_activity(user.athlete_id, activity_id)
        .await?;
    let summary = ActivitySummary::from_activity(&activity, chrono::Utc::now());

    Ok(Json(ActivityDetailResponse { activity, summary }))
}
