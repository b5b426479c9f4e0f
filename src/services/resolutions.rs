// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolution collection controller, scoped to one year.

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::middleware::Session;
use crate::models::{Progress, Resolution, ResolutionChange, Year};
use crate::services::read_or_empty;
use crate::time_utils::now_rfc3339;
use crate::validation;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Title and optional description, as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A year with its resolutions and their aggregate progress.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ResolutionList {
    pub year: Year,
    pub resolutions: Vec<Resolution>,
    pub progress: Progress,
    /// "1 of 3 completed (33%)"
    pub summary: String,
}

pub struct ResolutionController<'a> {
    db: &'a RecordStore,
    session: &'a Session,
}

impl<'a> ResolutionController<'a> {
    pub fn new(db: &'a RecordStore, session: &'a Session) -> Self {
        Self { db, session }
    }

    fn owner(&self) -> &str {
        &self.session.account_id
    }

    /// Load a year owned by the session's account. Missing and foreign years
    /// are both not-found.
    pub async fn load_year(&self, year_id: &str) -> Result<Year> {
        self.db
            .get_year(self.owner(), year_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Year {} not found", year_id)))
    }

    async fn load_resolution(&self, resolution_id: &str) -> Result<Resolution> {
        self.db
            .get_resolution(self.owner(), resolution_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resolution {} not found", resolution_id)))
    }

    /// Resolutions of a year, newest first, with progress.
    pub async fn list(&self, year_id: &str) -> Result<ResolutionList> {
        let year = self.load_year(year_id).await?;
        self.list_for(year).await
    }

    async fn list_for(&self, year: Year) -> Result<ResolutionList> {
        let resolutions = read_or_empty(
            self.db.list_resolutions(self.owner(), &year.id).await,
            "resolutions",
        )?;
        let progress = Progress::from_flags(resolutions.iter().map(|r| r.is_completed));

        Ok(ResolutionList {
            year,
            summary: progress.resolution_summary(),
            resolutions,
            progress,
        })
    }

    pub async fn create(&self, year_id: &str, input: &ResolutionInput) -> Result<ResolutionList> {
        let title = validation::resolution_title(&input.title)?;
        let description = validation::description(input.description.as_deref());

        let year = self.load_year(year_id).await?;
        let resolution = Resolution::new(self.owner(), &year.id, title, description, now_rfc3339());
        self.db.insert_resolution(&resolution).await?;

        tracing::info!(
            account_id = %self.owner(),
            year_id = %year.id,
            resolution_id = %resolution.id,
            "Resolution created"
        );

        self.list_for(year).await
    }

    /// Flip the completion flag. Targets are not consulted or changed.
    pub async fn toggle(&self, resolution_id: &str) -> Result<ResolutionList> {
        let current = self.load_resolution(resolution_id).await?;
        let change = ResolutionChange::Completion(!current.is_completed);
        self.apply(current, change).await
    }

    pub async fn update(
        &self,
        resolution_id: &str,
        input: &ResolutionInput,
    ) -> Result<ResolutionList> {
        let change = ResolutionChange::Details {
            title: validation::resolution_title(&input.title)?,
            description: validation::description(input.description.as_deref()),
        };
        let current = self.load_resolution(resolution_id).await?;
        self.apply(current, change).await
    }

    async fn apply(&self, current: Resolution, change: ResolutionChange) -> Result<ResolutionList> {
        self.db
            .update_resolution(self.owner(), &current.id, &change, &now_rfc3339())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resolution {} not found", current.id)))?;

        tracing::debug!(
            account_id = %self.owner(),
            resolution_id = %current.id,
            ?change,
            "Resolution updated"
        );

        self.list(&current.year_id).await
    }

    /// Delete a resolution and its targets.
    pub async fn delete(&self, resolution_id: &str) -> Result<ResolutionList> {
        let current = self.load_resolution(resolution_id).await?;
        self.db
            .delete_resolution(self.owner(), resolution_id)
            .await?;

        tracing::info!(
            account_id = %self.owner(),
            resolution_id,
            "Resolution deleted"
        );

        self.list(&current.year_id).await
    }
}
