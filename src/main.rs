// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Statcard API Server
//!
//! Signs athletes in with Strava and renders shareable activity cards.

use statcard::{card::CardRenderer, config::Config, db::FirestoreDb, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Statcard API");

    let db = match &config.gcp_project_id {
        Some(project_id) => FirestoreDb::new(project_id).await?,
        None => {
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory store");
            FirestoreDb::new_memory()
        }
    };

    // Font discovery is slow; do it once before accepting requests.
    let card_renderer = tokio::task::spawn_blocking(CardRenderer::new).await?;

    let state = Arc::new(AppState::new(config.clone(), db, card_renderer));

    let app = statcard::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("statcard=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
