// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Statcard: shareable stat cards for Strava activities
//!
//! This crate provides the backend API: Strava sign-in and token upkeep,
//! cached activity fetching, and the card pipeline (layout, drag snapping,
//! SVG and PNG export).

pub mod card;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use card::CardRenderer;
use config::Config;
use db::FirestoreDb;
use services::StravaService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub strava_service: StravaService,
    pub card_renderer: CardRenderer,
}

impl AppState {
    /// Wire services from config around an already-connected store.
    pub fn new(config: Config, db: FirestoreDb, card_renderer: CardRenderer) -> Self {
        let strava_service = StravaService::from_config(&config, db.clone());
        Self {
            config,
            db,
            strava_service,
            card_renderer,
        }
    }
}
