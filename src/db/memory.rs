// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local record store with the same scoping, ordering and cascade
//! rules as the Firestore backend. Used for local development and tests.

use crate::error::AppError;
use crate::models::{Resolution, ResolutionChange, Target, TargetChange, Year};
use crate::validation::ValidationError;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Collections {
    // Kept in insertion order.
    years: Vec<Year>,
    resolutions: Vec<Resolution>,
    targets: Vec<Target>,
}

/// In-memory record store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Years ───────────────────────────────────────────────────

    pub async fn list_years(&self, owner_id: &str) -> Result<Vec<Year>, AppError> {
        let data = self.inner.read().await;
        let mut years: Vec<Year> = data
            .years
            .iter()
            .filter(|y| y.owner_id == owner_id)
            .cloned()
            .collect();
        years.sort_by(|a, b| b.year_number.cmp(&a.year_number));
        Ok(years)
    }

    pub async fn get_year(&self, owner_id: &str, year_id: &str) -> Result<Option<Year>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .years
            .iter()
            .find(|y| y.id == year_id && y.owner_id == owner_id)
            .cloned())
    }

    pub async fn insert_year(&self, year: &Year) -> Result<(), AppError> {
        let mut data = self.inner.write().await;
        if data.years.iter().any(|y| y.id == year.id) {
            return Err(ValidationError::DuplicateYear.into());
        }
        data.years.push(year.clone());
        Ok(())
    }

    pub async fn delete_year(&self, owner_id: &str, year_id: &str) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        let before = data.years.len();
        data.years.retain(|y| !(y.id == year_id && y.owner_id == owner_id));
        if data.years.len() == before {
            return Ok(false);
        }

        let orphaned: Vec<String> = data
            .resolutions
            .iter()
            .filter(|r| r.year_id == year_id)
            .map(|r| r.id.clone())
            .collect();
        data.resolutions.retain(|r| r.year_id != year_id);
        data.targets.retain(|t| !orphaned.contains(&t.resolution_id));
        Ok(true)
    }

    // ─── Resolutions ─────────────────────────────────────────────

    pub async fn list_resolutions(
        &self,
        owner_id: &str,
        year_id: &str,
    ) -> Result<Vec<Resolution>, AppError> {
        let data = self.inner.read().await;
        // Walk newest inserts first so equal timestamps still list newest first
        // after the stable sort.
        let mut resolutions: Vec<Resolution> = data
            .resolutions
            .iter()
            .rev()
            .filter(|r| r.owner_id == owner_id && r.year_id == year_id)
            .cloned()
            .collect();
        resolutions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(resolutions)
    }

    pub async fn get_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<Option<Resolution>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .resolutions
            .iter()
            .find(|r| r.id == resolution_id && r.owner_id == owner_id)
            .cloned())
    }

    pub async fn insert_resolution(&self, resolution: &Resolution) -> Result<(), AppError> {
        self.inner.write().await.resolutions.push(resolution.clone());
        Ok(())
    }

    pub async fn update_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
        change: &ResolutionChange,
        now: &str,
    ) -> Result<Option<Resolution>, AppError> {
        let mut data = self.inner.write().await;
        Ok(data
            .resolutions
            .iter_mut()
            .find(|r| r.id == resolution_id && r.owner_id == owner_id)
            .map(|r| {
                r.apply(change, now);
                r.clone()
            }))
    }

    pub async fn delete_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        let before = data.resolutions.len();
        data.resolutions.retain(|r| !(r.id == resolution_id && r.owner_id == owner_id));
        if data.resolutions.len() == before {
            return Ok(false);
        }
        data.targets.retain(|t| t.resolution_id != resolution_id);
        Ok(true)
    }

    // ─── Targets ─────────────────────────────────────────────────

    pub async fn list_targets(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<Vec<Target>, AppError> {
        let data = self.inner.read().await;
        let mut targets: Vec<Target> = data
            .targets
            .iter()
            .filter(|t| t.owner_id == owner_id && t.resolution_id == resolution_id)
            .cloned()
            .collect();
        targets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(targets)
    }

    pub async fn get_target(
        &self,
        owner_id: &str,
        target_id: &str,
    ) -> Result<Option<Target>, AppError> {
        let data = self.inner.read().await;
        Ok(data
            .targets
            .iter()
            .find(|t| t.id == target_id && t.owner_id == owner_id)
            .cloned())
    }

    pub async fn insert_target(&self, target: &Target) -> Result<(), AppError> {
        self.inner.write().await.targets.push(target.clone());
        Ok(())
    }

    pub async fn update_target(
        &self,
        owner_id: &str,
        target_id: &str,
        change: &TargetChange,
    ) -> Result<Option<Target>, AppError> {
        let mut data = self.inner.write().await;
        Ok(data
            .targets
            .iter_mut()
            .find(|t| t.id == target_id && t.owner_id == owner_id)
            .map(|t| {
                t.apply(change);
                t.clone()
            }))
    }

    pub async fn delete_target(&self, owner_id: &str, target_id: &str) -> Result<bool, AppError> {
        let mut data = self.inner.write().await;
        let before = data.targets.len();
        data.targets.retain(|t| !(t.id == target_id && t.owner_id == owner_id));
        Ok(data.targets.len() != before)
    }
}
