// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Target model: a milestone within a Resolution.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Target record stored in the `targets` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Target {
    pub id: String,
    /// Parent resolution
    pub resolution_id: String,
    /// Owning account
    pub owner_id: String,
    pub title: String,
    pub is_completed: bool,
    pub created_at: String,
}

impl Target {
    pub fn new(owner_id: &str, resolution_id: &str, title: String, now: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            resolution_id: resolution_id.to_string(),
            owner_id: owner_id.to_string(),
            title,
            is_completed: false,
            created_at: now,
        }
    }

    pub fn apply(&mut self, change: &TargetChange) {
        match change {
            TargetChange::Completion(done) => self.is_completed = *done,
            TargetChange::Title(title) => self.title = title.clone(),
        }
    }
}

/// Partial update of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetChange {
    Completion(bool),
    Title(String),
}
