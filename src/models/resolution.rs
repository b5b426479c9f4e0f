// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolution model: a goal within a Year.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Resolution record stored in the `resolutions` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Resolution {
    pub id: String,
    /// Parent year
    pub year_id: String,
    /// Owning account (same as the parent year's)
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Tracked independently of the targets' flags
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Resolution {
    pub fn new(
        owner_id: &str,
        year_id: &str,
        title: String,
        description: Option<String>,
        now: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            year_id: year_id.to_string(),
            owner_id: owner_id.to_string(),
            title,
            description,
            is_completed: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, change: &ResolutionChange, now: &str) {
        match change {
            ResolutionChange::Completion(done) => self.is_completed = *done,
            ResolutionChange::Details { title, description } => {
                self.title = title.clone();
                self.description = description.clone();
            }
        }
        self.updated_at = now.to_string();
    }
}

/// Partial update of a resolution. Each variant writes only its own fields
/// (plus `updated_at`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionChange {
    Completion(bool),
    Details {
        title: String,
        description: Option<String>,
    },
}
