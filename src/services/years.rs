// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Year collection controller.

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::middleware::Session;
use crate::models::Year;
use crate::services::read_or_empty;
use crate::time_utils::now_rfc3339;
use crate::validation::{self, ValidationError};

/// Years of the session's account.
pub struct YearController<'a> {
    db: &'a RecordStore,
    session: &'a Session,
}

impl<'a> YearController<'a> {
    pub fn new(db: &'a RecordStore, session: &'a Session) -> Self {
        Self { db, session }
    }

    /// All of the account's years, most recent first.
    pub async fn list(&self) -> Result<Vec<Year>> {
        read_or_empty(self.db.list_years(&self.session.account_id).await, "years")
    }

    /// Validate and insert a year, then return the refetched list.
    ///
    /// The duplicate check runs against the account's current list; the store
    /// rejects a duplicate insert that races past it.
    pub async fn create(&self, raw_year_number: &serde_json::Value) -> Result<Vec<Year>> {
        let year_number = validation::parse_year_number(raw_year_number)?;

        let current = self.list().await?;
        if current.iter().any(|y| y.year_number == year_number) {
            return Err(ValidationError::DuplicateYear.into());
        }

        let year = Year::new(&self.session.account_id, year_number, now_rfc3339());
        self.db.insert_year(&year).await?;

        tracing::info!(
            account_id = %self.session.account_id,
            year_id = %year.id,
            year_number,
            "Year created"
        );

        self.list().await
    }

    /// Delete a year (cascading to its resolutions and targets), then return
    /// the refetched list.
    pub async fn delete(&self, year_id: &str) -> Result<Vec<Year>> {
        let deleted = self.db.delete_year(&self.session.account_id, year_id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Year {} not found", year_id)));
        }

        tracing::info!(
            account_id = %self.session.account_id,
            year_id,
            "Year deleted"
        );

        self.list().await
    }
}
