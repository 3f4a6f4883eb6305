// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shareable activity card: stat catalog, layout, drag snapping and drawing.

pub mod catalog;
pub mod format;
pub mod layout;
pub mod render;
pub mod svg;

pub use catalog::{CardOptions, FontId, FontSizeId, GradientId, StatId};
pub use layout::{drag_element, layout_card, CanvasSize, CardLayout, DragOutcome, Guide, Point};
pub use render::{export_file_name, render_svg, CardRenderer, RenderError};
