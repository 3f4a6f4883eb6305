// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Card editor routes: option catalog, layout, drag snapping and export.
//!
//! The editor is stateless on the server. Every request carries the full
//! design and viewport; the response is what the front end draws next.

use crate::card::catalog::{CardOptions, StatId};
use crate::card::layout::{apply_drag, drag_element, layout_card, CanvasSize, CardLayout, Guide, Point};
use crate::card::render::{export_file_name, render_svg};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CardDesign, StravaActivity, Viewport};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/card/options", get(get_options))
        .route("/api/activities/{id}/card/layout", post(post_layout))
        .route("/api/activities/{id}/card/drag", post(post_drag))
        .route("/api/activities/{id}/card", post(post_render))
}

// ─── Options ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct OptionsQuery {
    /// Mark stats this activity has no value for as unavailable.
    activity_id: Option<u64>,
}

async fn get_options(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<OptionsQuery>,
) -> Result<Json<CardOptions>> {
    let options = match query.activity_id {
        Some(id) => {
            let activity = state.strava_service.get_activity(user.athlete_id, id).await?;
            CardOptions::for_activity(&activity)
        }
        None => CardOptions::catalog(),
    };
    Ok(Json(options))
}

// ─── Layout ──────────────────────────────────────────────────

/// Editor state shared by every card request.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardRequest {
    #[serde(default)]
    pub design: CardDesign,
    #[serde(default)]
    pub viewport: Viewport,
}

impl CardRequest {
    fn validate(&self) -> Result<()> {
        self.design.validate()?;
        self.viewport.validate()?;
        Ok(())
    }
}

/// Load the activity and lay the card out for this request.
async fn prepare(
    state: &AppState,
    athlete_id: u64,
    activity_id: u64,
    request: &CardRequest,
) -> Result<(StravaActivity, CardLayout)> {
    request.validate()?;
    let activity = state
        .strava_service
        .get_activity(athlete_id, activity_id)
        .await?;
    let layout = layout_card(
        &activity,
        &request.design,
        CanvasSize::from_viewport(&request.viewport),
    );
    Ok((activity, layout))
}

async fn post_layout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
    Json(request): Json<CardRequest>,
) -> Result<Json<CardLayout>> {
    let (_, layout) = prepare(&state, user.athlete_id, activity_id, &request).await?;
    Ok(Json(layout))
}

// ─── Drag ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DragRequest {
    #[serde(flatten)]
    pub card: CardRequest,
    pub element: StatId,
    /// Requested anchor, display pixels
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DragResponse {
    /// Design with the element's new position stored
    pub design: CardDesign,
    pub anchor: Point,
    /// Guides to draw while the pointer is down
    pub guides: Vec<Guide>,
}

async fn post_drag(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
    Json(request): Json<DragRequest>,
) -> Result<Json<DragResponse>> {
    if !request.x.is_finite() || !request.y.is_finite() {
        return Err(AppError::BadRequest("Drag target must be finite".to_string()));
    }

    let (_, layout) = prepare(&state, user.athlete_id, activity_id, &request.card).await?;

    let outcome = drag_element(
        &layout,
        request.element,
        Point {
            x: request.x,
            y: request.y,
        },
    )
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut design = request.card.design;
    apply_drag(&mut design, &outcome);

    Ok(Json(DragResponse {
        design,
        anchor: outcome.anchor,
        guides: outcome.guides,
    }))
}

// ─── Export ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Svg,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
    /// Ask the browser to save the file instead of displaying it.
    #[serde(default)]
    download: bool,
}

async fn post_render(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<u64>,
    Query(query): Query<ExportQuery>,
    Json(request): Json<CardRequest>,
) -> Result<Response> {
    let (activity, layout) = prepare(&state, user.athlete_id, activity_id, &request).await?;
    let svg = render_svg(&layout, activity.summary_polyline());

    let body = match query.format {
        ExportFormat::Svg => svg.into_bytes(),
        ExportFormat::Png => {
            let renderer = state.card_renderer.clone();
            tokio::task::spawn_blocking(move || renderer.render_png(&svg))
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Render task failed: {}", e)))?
                .map_err(|e| AppError::Internal(e.into()))?
        }
    };

    tracing::debug!(
        athlete_id = user.athlete_id,
        activity_id,
        format = query.format.extension(),
        bytes = body.len(),
        "Rendered card"
    );

    let mut response = (
        [(header::CONTENT_TYPE, query.format.content_type())],
        body,
    )
        .into_response();

    if query.download {
        let disposition = format!(
            "attachment; filename=\"{}\"",
            export_file_name(&activity, query.format.extension())
        );
        let value = HeaderValue::from_str(&disposition)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Bad file name: {}", e)))?;
        response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
