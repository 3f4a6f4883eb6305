// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fixed catalogs the card editor offers: stats, fonts, backgrounds, sizes.

use crate::card::format::{format_date, format_distance, format_pace, format_speed, format_time};
use crate::models::StravaActivity;
use crate::time_utils::parse_strava_date;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

// ─── Stats ───────────────────────────────────────────────────

/// A statistic that can be placed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum StatId {
    Title,
    Distance,
    Time,
    AvgPower,
    AvgHr,
    MaxHr,
    AvgCadence,
    Date,
    MaxSpeed,
    AvgSpeed,
    Pace,
    Calories,
    TotalElevation,
}

/// How a stat is typeset on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatStyle {
    /// Bold headline without a label.
    Title,
    /// Large value with a small label underneath.
    Metric,
    /// Small dimmed line without a label.
    Caption,
}

impl StatId {
    /// Every stat, in picker order.
    pub const ALL: [StatId; 13] = [
        StatId::Title,
        StatId::Distance,
        StatId::Time,
        StatId::AvgPower,
        StatId::AvgHr,
        StatId::MaxHr,
        StatId::AvgCadence,
        StatId::Date,
        StatId::MaxSpeed,
        StatId::AvgSpeed,
        StatId::Pace,
        StatId::Calories,
        StatId::TotalElevation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatId::Title => "Title",
            StatId::Distance => "Distance",
            StatId::Time => "Moving Time",
            StatId::AvgPower => "Avg Power",
            StatId::AvgHr => "Avg Heart Rate",
            StatId::MaxHr => "Max HR",
            StatId::AvgCadence => "Avg Cadence",
            StatId::Date => "Date",
            StatId::MaxSpeed => "Max Speed",
            StatId::AvgSpeed => "Avg Speed",
            StatId::Pace => "Pace",
            StatId::Calories => "Calories",
            StatId::TotalElevation => "Total Elevation",
        }
    }

    /// Short caption drawn under a metric value.
    pub fn caption(self) -> &'static str {
        match self {
            StatId::Time => "Time",
            StatId::AvgHr => "Avg HR",
            StatId::TotalElevation => "Elevation",
            other => other.label(),
        }
    }

    pub fn style(self) -> StatStyle {
        match self {
            StatId::Title => StatStyle::Title,
            StatId::Date => StatStyle::Caption,
            _ => StatStyle::Metric,
        }
    }

    /// Formatted value for this activity, or `None` when Strava did not
    /// record it.
    pub fn value(self, activity: &StravaActivity) -> Option<String> {
        match self {
            StatId::Title => {
                let name = activity.name.trim();
                (!name.is_empty()).then(|| name.to_string())
            }
            StatId::Distance => Some(format_distance(activity.distance)),
            StatId::Time => Some(format_time(activity.moving_time)),
            StatId::AvgPower => present(activity.average_watts).map(|w| format!("{}W", round(w))),
            StatId::AvgHr => {
                present(activity.average_heartrate).map(|hr| format!("{} bpm", round(hr)))
            }
            StatId::MaxHr => present(activity.max_heartrate).map(|hr| format!("{} bpm", round(hr))),
            StatId::AvgCadence => {
                present(activity.average_cadence).map(|c| format!("{} rpm", round(c)))
            }
            StatId::Date => parse_strava_date(activity.local_start_date()).map(format_date),
            StatId::MaxSpeed => Some(format_speed(activity.max_speed)),
            StatId::AvgSpeed => Some(format_speed(activity.average_speed)),
            StatId::Pace => format_pace(activity.average_speed, &activity.activity_type),
            StatId::Calories => present(activity.calories).map(|c| format!("{} cal", round(c))),
            StatId::TotalElevation => Some(format!("{}m", round(activity.total_elevation_gain))),
        }
    }
}

/// Strava reports some sensor fields as 0 when no sensor was attached.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

// ─── Fonts ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "kebab-case")]
pub enum FontId {
    #[default]
    Inter,
    System,
    Geist,
    GeistMono,
    Roboto,
    Montserrat,
}

/// A selectable typeface.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FontOption {
    pub id: FontId,
    pub name: &'static str,
    /// CSS `font-family` value.
    pub value: &'static str,
    /// Multiplier that evens out optical size across families.
    pub size_adjust: f64,
    pub monospace: bool,
}

pub static FONTS: [FontOption; 6] = [
    FontOption {
        id: FontId::Inter,
        name: "Inter",
        value: "'Inter', sans-serif",
        size_adjust: 1.0,
        monospace: false,
    },
    FontOption {
        id: FontId::System,
        name: "System",
        value: "system-ui",
        size_adjust: 1.0,
        monospace: false,
    },
    FontOption {
        id: FontId::Geist,
        name: "Geist",
        value: "'Geist', sans-serif",
        size_adjust: 1.0,
        monospace: false,
    },
    FontOption {
        id: FontId::GeistMono,
        name: "Geist Mono",
        value: "'Geist Mono', monospace",
        size_adjust: 0.95,
        monospace: true,
    },
    FontOption {
        id: FontId::Roboto,
        name: "Roboto",
        value: "'Roboto', sans-serif",
        size_adjust: 1.1,
        monospace: false,
    },
    FontOption {
        id: FontId::Montserrat,
        name: "Montserrat",
        value: "'Montserrat', sans-serif",
        size_adjust: 1.05,
        monospace: false,
    },
];

impl FontId {
    pub fn option(self) -> &'static FontOption {
        // FONTS is indexed in declaration order.
        &FONTS[self as usize]
    }
}

// ─── Backgrounds ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum GradientId {
    #[default]
    None,
    Midnight,
    Sunset,
    Forest,
    Twilight,
    Ember,
}

/// RGBA color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);

    /// `rgb(r, g, b)` without the alpha channel (SVG paints carry alpha separately).
    pub fn rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GradientStops {
    pub from: Rgba,
    pub to: Rgba,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GradientOption {
    pub id: GradientId,
    pub name: &'static str,
    /// `None` leaves the card transparent.
    pub value: Option<GradientStops>,
}

pub static GRADIENTS: [GradientOption; 6] = [
    GradientOption {
        id: GradientId::None,
        name: "Transparent",
        value: None,
    },
    GradientOption {
        id: GradientId::Midnight,
        name: "Midnight Blue",
        value: Some(GradientStops {
            from: Rgba::new(30, 58, 138, 0.05),
            to: Rgba::new(59, 130, 246, 0.15),
        }),
    },
    GradientOption {
        id: GradientId::Sunset,
        name: "Sunset",
        value: Some(GradientStops {
            from: Rgba::new(121, 40, 202, 0.05),
            to: Rgba::new(255, 0, 128, 0.15),
        }),
    },
    GradientOption {
        id: GradientId::Forest,
        name: "Forest",
        value: Some(GradientStops {
            from: Rgba::new(6, 78, 59, 0.05),
            to: Rgba::new(5, 150, 105, 0.15),
        }),
    },
    GradientOption {
        id: GradientId::Twilight,
        name: "Twilight",
        value: Some(GradientStops {
            from: Rgba::new(49, 46, 129, 0.05),
            to: Rgba::new(129, 140, 248, 0.15),
        }),
    },
    GradientOption {
        id: GradientId::Ember,
        name: "Ember",
        value: Some(GradientStops {
            from: Rgba::new(24, 24, 27, 0.05),
            to: Rgba::new(220, 38, 38, 0.15),
        }),
    },
];

impl GradientId {
    pub fn option(self) -> &'static GradientOption {
        &GRADIENTS[self as usize]
    }
}

// ─── Font sizes ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum FontSizeId {
    Xs,
    S,
    #[default]
    M,
    L,
    Xl,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FontSizeOption {
    pub id: FontSizeId,
    pub label: &'static str,
    pub value: f64,
}

pub static FONT_SIZES: [FontSizeOption; 5] = [
    FontSizeOption {
        id: FontSizeId::Xs,
        label: "XS",
        value: 0.6,
    },
    FontSizeOption {
        id: FontSizeId::S,
        label: "S",
        value: 0.8,
    },
    FontSizeOption {
        id: FontSizeId::M,
        label: "M",
        value: 1.0,
    },
    FontSizeOption {
        id: FontSizeId::L,
        label: "L",
        value: 1.2,
    },
    FontSizeOption {
        id: FontSizeId::Xl,
        label: "XL",
        value: 1.4,
    },
];

impl FontSizeId {
    pub fn multiplier(self) -> f64 {
        FONT_SIZES[self as usize].value
    }
}

// ─── Catalog response ────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatOption {
    pub id: StatId,
    pub label: &'static str,
    pub available: bool,
}

/// Everything the editor's pickers need.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardOptions {
    pub stats: Vec<StatOption>,
    pub fonts: Vec<FontOption>,
    pub gradients: Vec<GradientOption>,
    pub font_sizes: Vec<FontSizeOption>,
}

impl CardOptions {
    pub fn catalog() -> Self {
        Self {
            stats: StatId::ALL
                .iter()
                .map(|&id| StatOption {
                    id,
                    label: id.label(),
                    available: true,
                })
                .collect(),
            fonts: FONTS.to_vec(),
            gradients: GRADIENTS.to_vec(),
            font_sizes: FONT_SIZES.to_vec(),
        }
    }

    /// Options with availability resolved against one activity.
    pub fn for_activity(activity: &StravaActivity) -> Self {
        let mut options = Self::catalog();
        for stat in &mut options.stats {
            stat.available = stat.id.value(activity).is_some();
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::tests::sample_activity;

    #[test]
    fn test_lookup_tables_match_declaration_order() {
        for font in &FONTS {
            assert_eq!(font.id.option().id, font.id);
        }
        for gradient in &GRADIENTS {
            assert_eq!(gradient.id.option().id, gradient.id);
        }
        for size in &FONT_SIZES {
            assert_eq!(size.id.multiplier(), size.value);
        }
    }

    #[test]
    fn test_stat_ids_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&StatId::TotalElevation).unwrap(),
            "\"total_elevation\""
        );
        assert_eq!(serde_json::to_string(&FontId::GeistMono).unwrap(), "\"geist-mono\"");
        let parsed: StatId = serde_json::from_str("\"avg_hr\"").unwrap();
        assert_eq!(parsed, StatId::AvgHr);
    }

    #[test]
    fn test_stat_values() {
        let activity = sample_activity();

        assert_eq!(StatId::Title.value(&activity).unwrap(), "Morning Ride");
        assert_eq!(StatId::Distance.value(&activity).unwrap(), "42.2 km");
        assert_eq!(StatId::Time.value(&activity).unwrap(), "1h 25m");
        assert_eq!(StatId::AvgPower.value(&activity).unwrap(), "188W");
        assert_eq!(StatId::AvgHr.value(&activity).unwrap(), "142 bpm");
        assert_eq!(StatId::MaxSpeed.value(&activity).unwrap(), "54.0 km/h");
        assert_eq!(StatId::TotalElevation.value(&activity).unwrap(), "412m");
        assert_eq!(StatId::Date.value(&activity).unwrap(), "October 18, 2026");
    }

    #[test]
    fn test_missing_sensor_data_is_unavailable() {
        let mut activity = sample_activity();
        activity.average_watts = Some(0.0);
        activity.average_cadence = None;
        activity.calories = None;

        assert_eq!(StatId::AvgPower.value(&activity), None);
        assert_eq!(StatId::AvgCadence.value(&activity), None);

        let options = CardOptions::for_activity(&activity);
        let power = options
            .stats
            .iter()
            .find(|s| s.id == StatId::AvgPower)
            .unwrap();
        assert!(!power.available);
    }
}
