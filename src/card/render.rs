// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Card drawing and rasterization.

use crate::card::catalog::Rgba;
use crate::card::layout::{CardLayout, Point, Rect};
use crate::card::svg::{Surface, TextStyle};
use crate::models::StravaActivity;
use geo::{BoundingRect, LineString};
use std::sync::Arc;

const ROUTE_STROKE: Rgba = Rgba::new(255, 255, 255, 0.9);

/// Draw a laid-out card onto a fresh SVG surface.
///
/// `route` is a Strava encoded polyline; it is only drawn when the layout
/// reserved a route area.
pub fn render_svg(layout: &CardLayout, route: Option<&str>) -> String {
    let canvas = &layout.canvas;
    let mut surface = Surface::new(canvas);

    if let Some(stops) = layout.background {
        let paint = surface.linear_gradient(
            Point { x: 0.0, y: 0.0 },
            Point {
                x: canvas.display_width,
                y: canvas.display_height,
            },
            stops.from,
            stops.to,
        );
        surface.fill_rect(
            Rect {
                x: 0.0,
                y: 0.0,
                width: canvas.display_width,
                height: canvas.display_height,
            },
            &paint,
        );
    }

    if let (Some(area), Some(encoded)) = (layout.route_area, route) {
        match project_route(encoded, area) {
            Some(points) => surface.stroke_polyline(&points, ROUTE_STROKE, canvas.base() * 0.08),
            None => tracing::debug!("Route polyline unusable, drawing card without it"),
        }
    }

    for element in &layout.elements {
        for line in &element.lines {
            surface.fill_text(
                &line.text,
                element.anchor.x,
                element.anchor.y + line.offset_y,
                TextStyle {
                    family: layout.font_family,
                    size: line.font_size,
                    weight: line.font_weight,
                    fill: Rgba { a: line.alpha, ..Rgba::WHITE },
                    align: element.align,
                },
            );
        }
    }

    surface.finish()
}

/// Decode a Strava polyline and fit it into `area`, north up, keeping its
/// aspect ratio and centering it.
pub fn project_route(encoded: &str, area: Rect) -> Option<Vec<Point>> {
    let line: LineString<f64> = polyline::decode_polyline(encoded, 5).ok()?;
    let bounds = line.bounding_rect()?;

    // Shrink longitudes so the trace isn't stretched away from the equator.
    let mid_lat = (bounds.min().y + bounds.max().y) / 2.0;
    let lon_scale = mid_lat.to_radians().cos().abs().max(1e-6);

    let span_x = bounds.width() * lon_scale;
    let span_y = bounds.height();
    if span_x <= 0.0 && span_y <= 0.0 {
        return None;
    }

    let scale = match (span_x > 0.0, span_y > 0.0) {
        (true, true) => (area.width / span_x).min(area.height / span_y),
        (true, false) => area.width / span_x,
        _ => area.height / span_y,
    };

    let offset_x = area.x + (area.width - span_x * scale) / 2.0;
    let offset_y = area.y + (area.height - span_y * scale) / 2.0;

    let points = line
        .coords()
        .map(|c| Point {
            x: offset_x + (c.x - bounds.min().x) * lon_scale * scale,
            y: offset_y + (bounds.max().y - c.y) * scale,
        })
        .collect();
    Some(points)
}

/// Download name for an exported card: `<slug>-<id>.<ext>`.
pub fn export_file_name(activity: &StravaActivity, ext: &str) -> String {
    let mut slug = String::with_capacity(activity.name.len());
    for c in activity.name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= 48 {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "activity" } else { slug };

    format!("{}-{}.{}", slug, activity.id, ext)
}

/// Rasterizes card SVGs to PNG.
///
/// System fonts are loaded once; clones share them.
#[derive(Clone)]
pub struct CardRenderer {
    options: Arc<usvg::Options<'static>>,
}

impl CardRenderer {
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        tracing::info!(faces = options.fontdb.len(), "Loaded fonts for card rendering");
        Self {
            options: Arc::new(options),
        }
    }

    /// Renderer without any fonts. Text is skipped when rasterizing.
    pub fn without_fonts() -> Self {
        Self {
            options: Arc::new(usvg::Options::default()),
        }
    }

    pub fn render_png(&self, svg: &str) -> Result<Vec<u8>, RenderError> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| RenderError::Parse(e.to_string()))?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or(RenderError::EmptyCanvas)?;

        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }
}

impl Default for CardRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from card rasterization.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to parse card SVG: {0}")]
    Parse(String),

    #[error("Card has no pixels")]
    EmptyCanvas,

    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}
