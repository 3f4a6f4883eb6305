// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pixel-space card layout.
//!
//! Everything here works in CSS (display) pixels. The device pixel ratio
//! only affects the size of the backing buffer; the drawing surface maps
//! display pixels onto it with a single scale.
//!
//! Text is never shaped here. Widths are estimated from character counts,
//! which is close enough for snapping and hit boxes.

use crate::card::catalog::{FontId, GradientStops, StatId, StatStyle};
use crate::models::{CardDesign, Position, StravaActivity, TextAlign, Viewport};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Cards are portrait 9:16 (story format).
pub const ASPECT_RATIO: f64 = 16.0 / 9.0;
/// Matches the editor's `max-w-sm` container.
pub const DEFAULT_DISPLAY_WIDTH: f64 = 384.0;
pub const MAX_DISPLAY_WIDTH: f64 = 1080.0;
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 4.0;
/// Longest raster edge. Large canvases get a lower effective DPR.
pub const MAX_BUFFER_HEIGHT: f64 = 3840.0;
/// Maximum distance (display px) at which an edge snaps to a guide.
pub const SNAP_THRESHOLD: f64 = 8.0;

const TITLE_Y: f64 = 0.06;
const METRICS_Y: f64 = 0.85;
const CAPTION_Y: f64 = 0.92;
const ROUTE_TOP: f64 = 0.15;
const ROUTE_BOTTOM: f64 = 0.75;

/// Edges closer than this (display px) count as aligned when reporting guides.
const ALIGN_EPSILON: f64 = 0.5;

// ─── Geometry ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    fn vertical_edges(&self) -> [f64; 3] {
        [self.x, self.center_x(), self.right()]
    }

    fn horizontal_edges(&self) -> [f64; 3] {
        [self.y, self.center_y(), self.bottom()]
    }

    fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Display and backing-buffer dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CanvasSize {
    pub display_width: f64,
    pub display_height: f64,
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub device_pixel_ratio: f64,
}

impl CanvasSize {
    pub fn new(display_width: f64, device_pixel_ratio: f64) -> Self {
        let display_width = if display_width.is_finite() {
            display_width.clamp(1.0, MAX_DISPLAY_WIDTH)
        } else {
            DEFAULT_DISPLAY_WIDTH
        };
        let display_height = display_width * ASPECT_RATIO;
        let max_ratio = (MAX_BUFFER_HEIGHT / display_height).min(MAX_DEVICE_PIXEL_RATIO);
        let device_pixel_ratio = if device_pixel_ratio.is_finite() {
            device_pixel_ratio.clamp(1.0, max_ratio)
        } else {
            1.0
        };

        Self {
            display_width,
            display_height,
            buffer_width: (display_width * device_pixel_ratio).floor() as u32,
            buffer_height: (display_height * device_pixel_ratio).floor() as u32,
            device_pixel_ratio,
        }
    }

    pub fn from_viewport(viewport: &Viewport) -> Self {
        Self::new(viewport.display_width, viewport.device_pixel_ratio)
    }

    /// Base typographic unit: a tenth of the display width.
    pub fn base(&self) -> f64 {
        self.display_width / 10.0
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_WIDTH, 1.0)
    }
}

// ─── Layout ──────────────────────────────────────────────────

/// One line of text within an element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TextLine {
    pub text: String,
    /// Display px
    pub font_size: f64,
    pub font_weight: u16,
    /// White at this opacity
    pub alpha: f64,
    /// Vertical distance from the anchor to this line's middle
    pub offset_y: f64,
    /// Estimated advance width
    pub width: f64,
}

/// A positioned stat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardElement {
    pub id: StatId,
    /// Text-align point of the first line, at its vertical middle
    pub anchor: Point,
    pub align: TextAlign,
    pub lines: Vec<TextLine>,
    pub bounds: Rect,
}

/// Fully resolved card, ready to draw.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardLayout {
    pub canvas: CanvasSize,
    pub font: FontId,
    pub font_family: &'static str,
    pub background: Option<GradientStops>,
    /// Area the GPS trace is fitted into, when requested
    pub route_area: Option<Rect>,
    pub grid_step: f64,
    pub snap_to_grid: bool,
    pub elements: Vec<CardElement>,
}

impl CardLayout {
    pub fn element(&self, id: StatId) -> Option<&CardElement> {
        self.elements.iter().find(|e| e.id == id)
    }
}

/// Lay out the selected stats of `activity` on a canvas.
///
/// Stats the activity has no value for are left out. Elements with a stored
/// position are anchored there; the rest fill their automatic slots.
pub fn layout_card(activity: &StravaActivity, design: &CardDesign, canvas: CanvasSize) -> CardLayout {
    let font = design.font.option();
    let scale = design.font_size.multiplier() * font.size_adjust;
    let metrics = TextMetrics {
        base: canvas.base(),
        scale,
        monospace: font.monospace,
    };

    let mut elements = Vec::with_capacity(design.stats.len());
    let mut metric_slot = 0usize;

    for &id in &design.stats {
        let Some(value) = id.value(activity) else {
            continue;
        };

        let (default_anchor, default_align) = match id.style() {
            StatStyle::Title => (
                Point {
                    x: metrics.base,
                    y: canvas.display_height * TITLE_Y,
                },
                TextAlign::Left,
            ),
            StatStyle::Caption => (
                Point {
                    x: metrics.base,
                    y: canvas.display_height * CAPTION_Y,
                },
                TextAlign::Left,
            ),
            StatStyle::Metric => {
                let slot = metric_slot;
                metric_slot += 1;
                metric_slot_anchor(slot, &canvas, &metrics)
            }
        };

        let (anchor, align) = match design.positions.get(&id) {
            Some(position) => (
                Point {
                    x: position.x * canvas.display_width,
                    y: position.y * canvas.display_height,
                },
                position.align.unwrap_or(default_align),
            ),
            None => (default_anchor, default_align),
        };

        let lines = metrics.lines_for(id, value);
        let bounds = element_bounds(anchor, align, &lines);

        elements.push(CardElement {
            id,
            anchor,
            align,
            lines,
            bounds,
        });
    }

    let route_area = design.show_route.then(|| Rect {
        x: metrics.base,
        y: canvas.display_height * ROUTE_TOP,
        width: canvas.display_width - 2.0 * metrics.base,
        height: canvas.display_height * (ROUTE_BOTTOM - ROUTE_TOP),
    });

    CardLayout {
        canvas,
        font: design.font,
        font_family: font.value,
        background: design.gradient.option().value,
        route_area,
        grid_step: canvas.display_width / f64::from(design.grid_divisions.max(1)),
        snap_to_grid: design.snap_to_grid,
        elements,
    }
}

/// Metrics fill two columns upward from the 85% line: left-aligned at the
/// left margin, right-aligned at the right margin.
fn metric_slot_anchor(slot: usize, canvas: &CanvasSize, metrics: &TextMetrics) -> (Point, TextAlign) {
    let row = (slot / 2) as f64;
    let y = canvas.display_height * METRICS_Y - row * 2.2 * metrics.base * metrics.scale;

    if slot % 2 == 0 {
        (Point { x: metrics.base, y }, TextAlign::Left)
    } else {
        (
            Point {
                x: canvas.display_width - metrics.base,
                y,
            },
            TextAlign::Right,
        )
    }
}

struct TextMetrics {
    base: f64,
    scale: f64,
    monospace: bool,
}

impl TextMetrics {
    fn lines_for(&self, id: StatId, value: String) -> Vec<TextLine> {
        let unit = self.base * self.scale;
        match id.style() {
            StatStyle::Title => vec![self.line(value, 0.8 * unit, 700, 1.0, 0.0)],
            StatStyle::Caption => vec![self.line(value, 0.4 * unit, 500, 0.6, 0.0)],
            StatStyle::Metric => vec![
                self.line(value, 1.2 * unit, 700, 1.0, 0.0),
                self.line(id.caption().to_string(), 0.5 * unit, 500, 0.8, 0.8 * unit),
            ],
        }
    }

    fn line(&self, text: String, font_size: f64, font_weight: u16, alpha: f64, offset_y: f64) -> TextLine {
        let width = self.estimate_width(&text, font_size, font_weight);
        TextLine {
            text,
            font_size,
            font_weight,
            alpha,
            offset_y,
            width,
        }
    }

    fn estimate_width(&self, text: &str, font_size: f64, font_weight: u16) -> f64 {
        let advance = if self.monospace { 0.6 } else { 0.56 };
        let weight = if font_weight >= 600 { 1.05 } else { 1.0 };
        text.chars().count() as f64 * font_size * advance * weight
    }
}

fn element_bounds(anchor: Point, align: TextAlign, lines: &[TextLine]) -> Rect {
    let mut left = f64::INFINITY;
    let mut right = f64::NEG_INFINITY;
    let mut top = f64::INFINITY;
    let mut bottom = f64::NEG_INFINITY;

    for line in lines {
        let x = match align {
            TextAlign::Left => anchor.x,
            TextAlign::Center => anchor.x - line.width / 2.0,
            TextAlign::Right => anchor.x - line.width,
        };
        let middle = anchor.y + line.offset_y;

        left = left.min(x);
        right = right.max(x + line.width);
        top = top.min(middle - line.font_size / 2.0);
        bottom = bottom.max(middle + line.font_size / 2.0);
    }

    if lines.is_empty() {
        return Rect {
            x: anchor.x,
            y: anchor.y,
            width: 0.0,
            height: 0.0,
        };
    }

    Rect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
}

// ─── Dragging ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// A vertical line at some x
    Vertical,
    /// A horizontal line at some y
    Horizontal,
}

/// Alignment line drawn while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Guide {
    pub orientation: Orientation,
    /// x for vertical guides, y for horizontal ones
    pub position: f64,
    /// Element the guide comes from; `None` for canvas margins and center
    pub element: Option<StatId>,
}

/// Where a dragged element ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DragOutcome {
    pub id: StatId,
    pub anchor: Point,
    pub bounds: Rect,
    /// Normalized position to store in the design
    pub position: Position,
    pub guides: Vec<Guide>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LayoutError {
    #[error("Element {0:?} is not on the card")]
    UnknownElement(StatId),
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    position: f64,
    element: Option<StatId>,
}

/// Move element `id` so its anchor lands near `to`.
///
/// Edges and centers within [`SNAP_THRESHOLD`] of a canvas margin, the
/// canvas center, or another element's edges snap onto it. An axis that did
/// not snap to a guide snaps to the grid when the design asks for it. The
/// element always stays inside the canvas.
pub fn drag_element(layout: &CardLayout, id: StatId, to: Point) -> Result<DragOutcome, LayoutError> {
    let element = layout.element(id).ok_or(LayoutError::UnknownElement(id))?;
    let canvas = &layout.canvas;

    // Anchor-to-box offset is constant while dragging.
    let box_dx = element.bounds.x - element.anchor.x;
    let box_dy = element.bounds.y - element.anchor.y;

    let proposed = Rect {
        x: to.x + box_dx,
        y: to.y + box_dy,
        ..element.bounds
    };

    let (vertical, horizontal) = candidates(layout, id);

    let snap_x = nearest_snap(&proposed.vertical_edges(), &vertical);
    let snap_y = nearest_snap(&proposed.horizontal_edges(), &horizontal);

    let mut anchor = to;
    match snap_x {
        Some(shift) => anchor.x += shift,
        None if layout.snap_to_grid => anchor.x = snap_to_step(anchor.x, layout.grid_step),
        None => {}
    }
    match snap_y {
        Some(shift) => anchor.y += shift,
        None if layout.snap_to_grid => anchor.y = snap_to_step(anchor.y, layout.grid_step),
        None => {}
    }

    // Keep the whole box on the canvas.
    let mut bounds = element.bounds.translate(anchor.x - element.anchor.x, anchor.y - element.anchor.y);
    let clamp_dx = clamp_shift(bounds.x, bounds.width, canvas.display_width);
    let clamp_dy = clamp_shift(bounds.y, bounds.height, canvas.display_height);
    bounds = bounds.translate(clamp_dx, clamp_dy);
    anchor.x += clamp_dx;
    anchor.y += clamp_dy;

    let guides = touching_guides(&bounds, &vertical, &horizontal);

    let position = Position {
        x: (anchor.x / canvas.display_width).clamp(0.0, 1.0),
        y: (anchor.y / canvas.display_height).clamp(0.0, 1.0),
        align: Some(element.align),
    };

    Ok(DragOutcome {
        id,
        anchor,
        bounds,
        position,
        guides,
    })
}

/// Store a drag result in the design so the next layout keeps it.
pub fn apply_drag(design: &mut CardDesign, outcome: &DragOutcome) {
    design.positions.insert(outcome.id, outcome.position);
}

fn candidates(layout: &CardLayout, dragged: StatId) -> (Vec<Candidate>, Vec<Candidate>) {
    let canvas = &layout.canvas;
    let base = canvas.base();
    let canvas_line = |position| Candidate {
        position,
        element: None,
    };

    let mut vertical = vec![
        canvas_line(base),
        canvas_line(canvas.display_width / 2.0),
        canvas_line(canvas.display_width - base),
    ];
    let mut horizontal = vec![
        canvas_line(canvas.display_height * TITLE_Y),
        canvas_line(canvas.display_height / 2.0),
        canvas_line(canvas.display_height * CAPTION_Y),
    ];

    for other in layout.elements.iter().filter(|e| e.id != dragged) {
        let element = Some(other.id);
        vertical.extend(
            other
                .bounds
                .vertical_edges()
                .into_iter()
                .map(|position| Candidate { position, element }),
        );
        horizontal.extend(
            other
                .bounds
                .horizontal_edges()
                .into_iter()
                .map(|position| Candidate { position, element }),
        );
    }

    (vertical, horizontal)
}

/// Smallest shift that puts one of `edges` on a candidate, if within threshold.
fn nearest_snap(edges: &[f64], candidates: &[Candidate]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for edge in edges {
        for candidate in candidates {
            let shift = candidate.position - edge;
            if shift.abs() <= SNAP_THRESHOLD && best.map_or(true, |b| shift.abs() < b.abs()) {
                best = Some(shift);
            }
        }
    }
    best
}

fn snap_to_step(value: f64, step: f64) -> f64 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

/// Shift needed to bring a span `[start, start + len]` inside `[0, limit]`.
fn clamp_shift(start: f64, len: f64, limit: f64) -> f64 {
    if len >= limit || start < 0.0 {
        -start
    } else if start + len > limit {
        limit - (start + len)
    } else {
        0.0
    }
}

fn touching_guides(bounds: &Rect, vertical: &[Candidate], horizontal: &[Candidate]) -> Vec<Guide> {
    let mut guides = Vec::new();

    let mut collect = |edges: [f64; 3], candidates: &[Candidate], orientation: Orientation| {
        for candidate in candidates {
            let touches = edges
                .iter()
                .any(|edge| (edge - candidate.position).abs() < ALIGN_EPSILON);
            let duplicate = guides.iter().any(|g: &Guide| {
                g.orientation == orientation && (g.position - candidate.position).abs() < ALIGN_EPSILON
            });
            if touches && !duplicate {
                guides.push(Guide {
                    orientation,
                    position: candidate.position,
                    element: candidate.element,
                });
            }
        }
    };

    collect(bounds.vertical_edges(), vertical, Orientation::Vertical);
    collect(bounds.horizontal_edges(), horizontal, Orientation::Horizontal);
    guides
}
