// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity model and the dashboard's list view of it.

use crate::card::format::{format_distance, format_relative, format_time};
use crate::time_utils::parse_strava_date;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Activity as returned by the Strava API (summary or detailed form).
///
/// Fields the detailed endpoint adds (calories, description) are optional
/// so the same type deserializes list entries too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StravaActivity {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    /// Meters
    #[serde(default)]
    pub distance: f64,
    /// Seconds
    #[serde(default)]
    pub moving_time: u64,
    /// Seconds
    #[serde(default)]
    pub elapsed_time: u64,
    /// Meters
    #[serde(default)]
    pub total_elevation_gain: f64,
    /// Legacy activity type (Ride, Run, Swim, ...)
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: String,
    /// UTC start (ISO 8601)
    pub start_date: String,
    /// Wall-clock start in the athlete's timezone, encoded with a `Z` suffix
    #[serde(default)]
    pub start_date_local: String,
    #[serde(default)]
    pub map: Option<StravaMap>,
    /// Meters per second
    #[serde(default)]
    pub average_speed: f64,
    /// Meters per second
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub average_watts: Option<f64>,
    #[serde(default)]
    pub kilojoules: Option<f64>,
    #[serde(default)]
    pub average_heartrate: Option<f64>,
    #[serde(default)]
    pub max_heartrate: Option<f64>,
    #[serde(default)]
    pub average_cadence: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StravaMap {
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

impl StravaActivity {
    /// Local start when Strava provided one, otherwise the UTC start.
    pub fn local_start_date(&self) -> &str {
        if self.start_date_local.is_empty() {
            &self.start_date
        } else {
            &self.start_date_local
        }
    }

    /// Encoded route, if the activity was recorded with GPS.
    pub fn summary_polyline(&self) -> Option<&str> {
        self.map
            .as_ref()
            .and_then(|m| m.summary_polyline.as_deref())
            .filter(|p| !p.is_empty())
    }
}

// ─── Activity types ──────────────────────────────────────────

/// Presentation hints for an activity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityTypeInfo {
    /// Material icon name
    pub icon: &'static str,
    pub label: String,
    /// Hex accent color
    pub color: &'static str,
}

const ACTIVITY_TYPES: &[(&str, &str, &str, &str)] = &[
    // (type, icon, label, color)
    ("Ride", "directions_bike", "Ride", "#3b82f6"),
    ("Run", "directions_run", "Run", "#22c55e"),
    ("Swim", "pool", "Swim", "#06b6d4"),
    ("Hike", "hiking", "Hike", "#f59e0b"),
    ("WeightTraining", "fitness_center", "Weight Training", "#a855f7"),
    ("NordicSki", "nordic_walking", "Nordic Ski", "#0ea5e9"),
    ("AlpineSki", "downhill_skiing", "Alpine Ski", "#0284c7"),
    ("Walk", "directions_walk", "Walk", "#14b8a6"),
    ("Surfing", "surfing", "Surfing", "#6366f1"),
    ("Windsurf", "kitesurfing", "Windsurf", "#60a5fa"),
    ("Skateboard", "skateboarding", "Skateboard", "#f97316"),
    ("Workout", "sports_kabaddi", "Workout", "#f43f5e"),
    ("Yoga", "sports_gymnastics", "Yoga", "#8b5cf6"),
    ("CrossFit", "sports_handball", "CrossFit", "#ef4444"),
    ("RockClimbing", "terrain", "Rock Climbing", "#78716c"),
];

/// Look up icon, label and color for a Strava activity type.
pub fn activity_type_info(activity_type: &str) -> ActivityTypeInfo {
    ACTIVITY_TYPES
        .iter()
        .find(|(t, ..)| *t == activity_type)
        .map(|&(_, icon, label, color)| ActivityTypeInfo {
            icon,
            label: label.to_string(),
            color,
        })
        .unwrap_or_else(|| ActivityTypeInfo {
            icon: "directions_walk",
            label: if activity_type.is_empty() {
                "Activity".to_string()
            } else {
                activity_type.to_string()
            },
            color: "#6b7280",
        })
}

// ─── Dashboard list item ─────────────────────────────────────

/// One entry in the recent activities list.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitySummary {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub type_info: ActivityTypeInfo,
    pub start_date: String,
    /// e.g. "3 days ago"
    pub started: String,
    pub distance: String,
    pub moving_time: String,
    pub elevation: String,
    pub average_power: Option<String>,
}

impl ActivitySummary {
    pub fn from_activity(activity: &StravaActivity, now: DateTime<Utc>) -> Self {
        let started = parse_strava_date(&activity.start_date)
            .map(|start| format_relative(start, now))
            .unwrap_or_default();

        Self {
            id: activity.id,
            name: activity.name.clone(),
            type_info: activity_type_info(&activity.activity_type),
            start_date: activity.start_date.clone(),
            started,
            distance: format_distance(activity.distance),
            moving_time: format_time(activity.moving_time),
            elevation: format!("{:.1}m", activity.total_elevation_gain),
            average_power: activity
                .average_watts
                .filter(|w| *w > 0.0)
                .map(|w| format!("{:.0}W", w)),
        }
    }
}
