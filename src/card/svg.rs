// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Minimal immediate-mode SVG drawing surface.
//!
//! Coordinates are display pixels. The document's `width`/`height` are the
//! backing-buffer size and its `viewBox` the display size, so rasterizing at
//! the document size applies the device pixel ratio exactly once.

use crate::card::catalog::Rgba;
use crate::card::layout::{CanvasSize, Point, Rect};
use crate::models::TextAlign;
use std::fmt::Write as _;

/// Font settings for one `fill_text` call.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    pub family: &'a str,
    pub size: f64,
    pub weight: u16,
    pub fill: Rgba,
    pub align: TextAlign,
}

pub struct Surface {
    width: u32,
    height: u32,
    view_width: f64,
    view_height: f64,
    defs: String,
    body: String,
    next_id: usize,
}

impl Surface {
    pub fn new(canvas: &CanvasSize) -> Self {
        Self {
            width: canvas.buffer_width.max(1),
            height: canvas.buffer_height.max(1),
            view_width: canvas.display_width,
            view_height: canvas.display_height,
            defs: String::new(),
            body: String::new(),
            next_id: 0,
        }
    }

    /// Define a linear gradient running from `start` to `end` and return a
    /// paint reference for it.
    pub fn linear_gradient(&mut self, start: Point, end: Point, from: Rgba, to: Rgba) -> String {
        self.next_id += 1;
        let id = format!("g{}", self.next_id);
        let _ = write!(
            self.defs,
            r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}"><stop offset="0" stop-color="{}" stop-opacity="{}"/><stop offset="1" stop-color="{}" stop-opacity="{}"/></linearGradient>"#,
            start.x,
            start.y,
            end.x,
            end.y,
            from.rgb(),
            from.a,
            to.rgb(),
            to.a,
        );
        format!("url(#{id})")
    }

    pub fn fill_rect(&mut self, rect: Rect, paint: &str) {
        let _ = write!(
            self.body,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            escape(paint),
        );
    }

    /// Draw text with its vertical middle at `y` and `x` interpreted
    /// according to the style's alignment.
    pub fn fill_text(&mut self, text: &str, x: f64, y: f64, style: TextStyle<'_>) {
        let anchor = match style.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let _ = write!(
            self.body,
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" font-weight="{}" fill="{}" fill-opacity="{}" text-anchor="{}" dominant-baseline="middle">{}</text>"#,
            x,
            y,
            escape(style.family),
            style.size,
            style.weight,
            style.fill.rgb(),
            style.fill.a,
            anchor,
            escape(text),
        );
    }

    pub fn stroke_polyline(&mut self, points: &[Point], stroke: Rgba, width: f64) {
        if points.len() < 2 {
            return;
        }
        let mut coords = String::with_capacity(points.len() * 16);
        for point in points {
            let _ = write!(coords, "{:.2},{:.2} ", point.x, point.y);
        }
        let _ = write!(
            self.body,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-opacity="{}" stroke-width="{:.2}" stroke-linecap="round" stroke-linejoin="round"/>"#,
            coords.trim_end(),
            stroke.rgb(),
            stroke.a,
            width,
        );
    }

    pub fn finish(self) -> String {
        let defs = if self.defs.is_empty() {
            String::new()
        } else {
            format!("<defs>{}</defs>", self.defs)
        };
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {:.2} {:.2}">{}{}</svg>"#,
            self.width, self.height, self.view_width, self.view_height, defs, self.body
        )
    }
}

/// Escape text for use in XML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}
