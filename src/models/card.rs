// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Card editor state sent by the front end.

use crate::card::catalog::{FontId, FontSizeId, GradientId, StatId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use validator::{Validate, ValidationError};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Everything the athlete picked in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct CardDesign {
    /// Selected stats, in the order they are auto-placed.
    #[validate(length(min = 1, max = 13), custom(function = "validate_unique_stats"))]
    pub stats: Vec<StatId>,
    pub font: FontId,
    pub font_size: FontSizeId,
    pub gradient: GradientId,
    /// Anchors of elements the athlete dragged, as fractions of the canvas.
    /// Elements without an entry use the automatic placement.
    #[validate(custom(function = "validate_positions"))]
    pub positions: BTreeMap<StatId, Position>,
    /// Draw the GPS trace behind the stats.
    pub show_route: bool,
    pub snap_to_grid: bool,
    #[validate(range(min = 2, max = 48))]
    pub grid_divisions: u32,
}

impl Default for CardDesign {
    fn default() -> Self {
        Self {
            stats: vec![StatId::Title, StatId::Distance, StatId::Time, StatId::Date],
            font: FontId::default(),
            font_size: FontSizeId::default(),
            gradient: GradientId::default(),
            positions: BTreeMap::new(),
            show_route: false,
            snap_to_grid: true,
            grid_divisions: 12,
        }
    }
}

/// Point in normalized canvas space (0,0 top-left, 1,1 bottom-right).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Alignment the element had when it was dropped; `None` keeps the
    /// alignment of its automatic slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

/// Horizontal text alignment relative to an element's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Size of the drawing surface in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(default)]
pub struct Viewport {
    /// CSS pixels
    #[validate(range(min = 1.0, max = 4096.0))]
    pub display_width: f64,
    #[validate(range(min = 0.5, max = 8.0))]
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            display_width: 384.0,
            device_pixel_ratio: 1.0,
        }
    }
}

fn validate_unique_stats(stats: &[StatId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if stats.iter().all(|s| seen.insert(*s)) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_stat"))
    }
}

fn validate_positions(positions: &BTreeMap<StatId, Position>) -> Result<(), ValidationError> {
    let in_range = |v: f64| (0.0..=1.0).contains(&v);
    if positions.values().all(|p| in_range(p.x) && in_range(p.y)) {
        Ok(())
    } else {
        Err(ValidationError::new("position_out_of_range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_design_is_valid() {
        assert!(CardDesign::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let design: CardDesign =
            serde_json::from_str(r#"{"stats": ["title", "pace"], "font": "geist-mono"}"#).unwrap();

        assert_eq!(design.stats, vec![StatId::Title, StatId::Pace]);
        assert_eq!(design.font, FontId::GeistMono);
        assert_eq!(design.grid_divisions, 12);
        assert!(design.snap_to_grid);
    }

    #[test]
    fn test_rejects_duplicates_and_empty_selection() {
        let mut design = CardDesign::default();
        design.stats = vec![StatId::Distance, StatId::Distance];
        assert!(design.validate().is_err());

        design.stats.clear();
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_rejects_positions_outside_canvas() {
        let mut design = CardDesign::default();
        design
            .positions
            .insert(StatId::Title, Position {
                x: 1.5,
                y: 0.2,
                align: None,
            });
        assert!(design.validate().is_err());
    }

    #[test]
    fn test_positions_keyed_by_stat_id() {
        let design: CardDesign =
            serde_json::from_str(r#"{"positions": {"distance": {"x": 0.5, "y": 0.5}}}"#).unwrap();
        assert_eq!(
            design.positions.get(&StatId::Distance),
            Some(&Position {
                x: 0.5,
                y: 0.5,
                align: None
            })
        );
    }
}
