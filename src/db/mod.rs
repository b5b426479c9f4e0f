// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! `RecordStore` is the hierarchical record store client: owner-scoped
//! selects, inserts, partial updates and deletes over the three collections.
//! Every method takes the acting account's ID, and records owned by another
//! account behave exactly like missing ones.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Resolution, ResolutionChange, Target, TargetChange, Year};

/// Collection names as constants.
pub mod collections {
    pub const YEARS: &str = "years";
    pub const RESOLUTIONS: &str = "resolutions";
    pub const TARGETS: &str = "targets";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
    /// Every call fails, as if the store were unreachable.
    Offline,
}

/// Owner-scoped client for years, resolutions and targets.
#[derive(Clone)]
pub struct RecordStore {
    backend: Backend,
}

macro_rules! dispatch {
    ($self:ident . $method:ident ( $($arg:expr),* )) => {
        match &$self.backend {
            Backend::Firestore(db) => db.$method($($arg),*).await,
            Backend::Memory(db) => db.$method($($arg),*).await,
            Backend::Offline => Err(AppError::Database(
                "Database not connected (offline mode)".to_string(),
            )),
        }
    };
}

impl RecordStore {
    /// Connect to Firestore (or the emulator when FIRESTORE_EMULATOR_HOST is set).
    pub async fn firestore(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreDb::new(project_id).await?),
        })
    }

    /// Fresh, empty in-memory store.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryDb::new()),
        }
    }

    /// Store whose every operation fails (offline mode, for testing).
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Firestore(_) => "firestore",
            Backend::Memory(_) => "memory",
            Backend::Offline => "offline",
        }
    }

    // ─── Years ───────────────────────────────────────────────────

    /// Years owned by `owner_id`, by year number descending.
    pub async fn list_years(&self, owner_id: &str) -> Result<Vec<Year>, AppError> {
        dispatch!(self.list_years(owner_id))
    }

    pub async fn get_year(&self, owner_id: &str, year_id: &str) -> Result<Option<Year>, AppError> {
        dispatch!(self.get_year(owner_id, year_id))
    }

    /// Fails with `DuplicateYear` if the owner already holds the year number.
    pub async fn insert_year(&self, year: &Year) -> Result<(), AppError> {
        dispatch!(self.insert_year(year))
    }

    /// Deletes the year, its resolutions and their targets.
    pub async fn delete_year(&self, owner_id: &str, year_id: &str) -> Result<bool, AppError> {
        dispatch!(self.delete_year(owner_id, year_id))
    }

    // ─── Resolutions ─────────────────────────────────────────────

    /// Resolutions of a year, newest first.
    pub async fn list_resolutions(
        &self,
        owner_id: &str,
        year_id: &str,
    ) -> Result<Vec<Resolution>, AppError> {
        dispatch!(self.list_resolutions(owner_id, year_id))
    }

    pub async fn get_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<Option<Resolution>, AppError> {
        dispatch!(self.get_resolution(owner_id, resolution_id))
    }

    pub async fn insert_resolution(&self, resolution: &Resolution) -> Result<(), AppError> {
        dispatch!(self.insert_resolution(resolution))
    }

    pub async fn update_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
        change: &ResolutionChange,
        now: &str,
    ) -> Result<Option<Resolution>, AppError> {
        dispatch!(self.update_resolution(owner_id, resolution_id, change, now))
    }

    /// Deletes the resolution and its targets.
    pub async fn delete_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<bool, AppError> {
        dispatch!(self.delete_resolution(owner_id, resolution_id))
    }

    // ─── Targets ─────────────────────────────────────────────────

    /// Targets of a resolution, oldest first.
    pub async fn list_targets(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<Vec<Target>, AppError> {
        dispatch!(self.list_targets(owner_id, resolution_id))
    }

    pub async fn get_target(
        &self,
        owner_id: &str,
        target_id: &str,
    ) -> Result<Option<Target>, AppError> {
        dispatch!(self.get_target(owner_id, target_id))
    }

    pub async fn insert_target(&self, target: &Target) -> Result<(), AppError> {
        dispatch!(self.insert_target(target))
    }

    pub async fn update_target(
        &self,
        owner_id: &str,
        target_id: &str,
        change: &TargetChange,
    ) -> Result<Option<Target>, AppError> {
        dispatch!(self.update_target(owner_id, target_id, change))
    }

    pub async fn delete_target(&self, owner_id: &str, target_id: &str) -> Result<bool, AppError> {
        dispatch!(self.delete_target(owner_id, target_id))
    }
}
