// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod card;
pub mod user;

pub use activity::{activity_type_info, ActivitySummary, ActivityTypeInfo, StravaActivity};
pub use card::{CardDesign, Position, TextAlign, Viewport};
pub use user::{User, UserTokens};
