// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod progress;
pub mod resolution;
pub mod target;
pub mod year;

pub use progress::Progress;
pub use resolution::{Resolution, ResolutionChange};
pub use target::{Target, TargetChange};
pub use year::Year;
