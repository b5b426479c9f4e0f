// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion percentages derived from loaded records.
//!
//! Never stored. A Year's progress is computed over its Resolutions, a
//! Resolution's over its Targets, each from the flags currently loaded.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Completed/total counts with the rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
    pub percentage: u32,
}

impl Progress {
    /// Build progress from per-record completion flags.
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let (completed, total) = flags.into_iter().fold((0u32, 0u32), |(done, all), flag| {
            (done + u32::from(flag), all + 1)
        });

        Self {
            completed,
            total,
            percentage: percentage(completed, total),
        }
    }

    /// `None` when there is nothing to measure; the indicator is not shown.
    pub fn visible(self) -> Option<Self> {
        (self.total > 0).then_some(self)
    }

    /// "3 of 4 completed (75%)"
    pub fn resolution_summary(&self) -> String {
        format!(
            "{} of {} completed ({}%)",
            self.completed, self.total, self.percentage
        )
    }

    /// "1 / 2 targets completed (50%)"
    pub fn target_summary(&self) -> String {
        format!(
            "{} / {} targets completed ({}%)",
            self.completed, self.total, self.percentage
        )
    }
}

/// round(100 * completed / total), rounding halves up; 0 when total is 0.
pub fn percentage(completed: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    ((200 * completed + total) / (2 * total)) as u32
}
