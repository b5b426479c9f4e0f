// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides owner-scoped operations for:
//! - Years (one document per owner and year number)
//! - Resolutions (children of a year)
//! - Targets (children of a resolution)
//!
//! Firestore has no cascading deletes, so deleting a parent walks its
//! children and removes them in batched transactions first.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Resolution, ResolutionChange, Target, TargetChange, Year};
use crate::validation::ValidationError;
use firestore::errors::FirestoreError;
use firestore::{FirestoreQueryDirection, FirestoreWritePrecondition};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

fn db_err(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

/// Updates carry an exists precondition; a document deleted since it was
/// read comes back as not found instead of being recreated.
fn not_found_as_none<T>(result: Result<T, FirestoreError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(doc) => Ok(Some(doc)),
        Err(FirestoreError::DataNotFoundError(_)) => Ok(None),
        Err(e) => Err(db_err(e)),
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Year Operations ─────────────────────────────────────────

    /// List an account's years, most recent first.
    pub async fn list_years(&self, owner_id: &str) -> Result<Vec<Year>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::YEARS)
            .filter(|q| q.for_all([q.field("owner_id").eq(owner_id)]))
            .order_by([("year_number", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Get a year by ID, if it belongs to `owner_id`.
    pub async fn get_year(&self, owner_id: &str, year_id: &str) -> Result<Option<Year>, AppError> {
        let year: Option<Year> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::YEARS)
            .obj()
            .one(year_id)
            .await
            .map_err(db_err)?;

        Ok(year.filter(|y| y.owner_id == owner_id))
    }

    /// Insert a new year. Create-only: an existing document with the same
    /// (owner, year number) ID is a duplicate.
    pub async fn insert_year(&self, year: &Year) -> Result<(), AppError> {
        let _: Year = self
            .client
            .fluent()
            .insert()
            .into(collections::YEARS)
            .document_id(&year.id)
            .object(year)
            .execute()
            .await
            .map_err(|e| match e {
                FirestoreError::DataConflictError(_) => {
                    AppError::Validation(ValidationError::DuplicateYear)
                }
                other => db_err(other),
            })?;
        Ok(())
    }

    /// Delete a year with all of its resolutions and their targets.
    ///
    /// Returns `false` if the year does not exist for this owner.
    pub async fn delete_year(&self, owner_id: &str, year_id: &str) -> Result<bool, AppError> {
        if self.get_year(owner_id, year_id).await?.is_none() {
            return Ok(false);
        }

        let resolutions = self.list_resolutions(owner_id, year_id).await?;

        let resolution_ids: Vec<String> = resolutions.iter().map(|r| r.id.clone()).collect();
        let target_lists = stream::iter(resolution_ids)
            .map(|resolution_id| async move { self.list_targets(owner_id, &resolution_id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Vec<Target>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Vec<Target>>, AppError>>()?;
        let targets: Vec<Target> = target_lists.into_iter().flatten().collect();

        self.batch_delete(&targets, collections::TARGETS, |t: &Target| t.id.clone())
            .await?;
        self.batch_delete(&resolutions, collections::RESOLUTIONS, |r: &Resolution| {
            r.id.clone()
        })
        .await?;

        self.delete_doc(collections::YEARS, year_id).await?;

        tracing::info!(
            owner_id,
            year_id,
            resolutions = resolutions.len(),
            targets = targets.len(),
            "Deleted year and children"
        );

        Ok(true)
    }

    // ─── Resolution Operations ───────────────────────────────────

    /// List a year's resolutions, newest first.
    pub async fn list_resolutions(
        &self,
        owner_id: &str,
        year_id: &str,
    ) -> Result<Vec<Resolution>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::RESOLUTIONS)
            .filter(|q| {
                q.for_all([
                    q.field("owner_id").eq(owner_id),
                    q.field("year_id").eq(year_id),
                ])
            })
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    pub async fn get_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<Option<Resolution>, AppError> {
        let resolution: Option<Resolution> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::RESOLUTIONS)
            .obj()
            .one(resolution_id)
            .await
            .map_err(db_err)?;

        Ok(resolution.filter(|r| r.owner_id == owner_id))
    }

    pub async fn insert_resolution(&self, resolution: &Resolution) -> Result<(), AppError> {
        let _: Resolution = self
            .client
            .fluent()
            .insert()
            .into(collections::RESOLUTIONS)
            .document_id(&resolution.id)
            .object(resolution)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Apply a partial update. Only the fields named by the change are written.
    pub async fn update_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
        change: &ResolutionChange,
        now: &str,
    ) -> Result<Option<Resolution>, AppError> {
        let Some(mut resolution) = self.get_resolution(owner_id, resolution_id).await? else {
            return Ok(None);
        };
        resolution.apply(change, now);
        self.write_resolution(&resolution, change).await
    }

    /// Write the fields named by `change` from an already-updated record.
    /// Returns `None` when the document no longer exists.
    pub async fn write_resolution(
        &self,
        resolution: &Resolution,
        change: &ResolutionChange,
    ) -> Result<Option<Resolution>, AppError> {
        let fields = match change {
            ResolutionChange::Completion(_) => {
                firestore::paths!(Resolution::{is_completed, updated_at})
            }
            ResolutionChange::Details { .. } => {
                firestore::paths!(Resolution::{title, description, updated_at})
            }
        };

        let updated: Result<Resolution, FirestoreError> = self
            .client
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::RESOLUTIONS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&resolution.id)
            .object(resolution)
            .execute()
            .await;

        not_found_as_none(updated)
    }

    /// Delete a resolution and its targets.
    pub async fn delete_resolution(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<bool, AppError> {
        if self.get_resolution(owner_id, resolution_id).await?.is_none() {
            return Ok(false);
        }

        let targets = self.list_targets(owner_id, resolution_id).await?;
        self.batch_delete(&targets, collections::TARGETS, |t: &Target| t.id.clone())
            .await?;
        self.delete_doc(collections::RESOLUTIONS, resolution_id).await?;

        tracing::debug!(
            owner_id,
            resolution_id,
            targets = targets.len(),
            "Deleted resolution and targets"
        );

        Ok(true)
    }

    // ─── Target Operations ───────────────────────────────────────

    /// List a resolution's targets in creation order.
    pub async fn list_targets(
        &self,
        owner_id: &str,
        resolution_id: &str,
    ) -> Result<Vec<Target>, AppError> {
        self.client
            .fluent()
            .select()
            .from(collections::TARGETS)
            .filter(|q| {
                q.for_all([
                    q.field("owner_id").eq(owner_id),
                    q.field("resolution_id").eq(resolution_id),
                ])
            })
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    pub async fn get_target(
        &self,
        owner_id: &str,
        target_id: &str,
    ) -> Result<Option<Target>, AppError> {
        let target: Option<Target> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::TARGETS)
            .obj()
            .one(target_id)
            .await
            .map_err(db_err)?;

        Ok(target.filter(|t| t.owner_id == owner_id))
    }

    pub async fn insert_target(&self, target: &Target) -> Result<(), AppError> {
        let _: Target = self
            .client
            .fluent()
            .insert()
            .into(collections::TARGETS)
            .document_id(&target.id)
            .object(target)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    pub async fn update_target(
        &self,
        owner_id: &str,
        target_id: &str,
        change: &TargetChange,
    ) -> Result<Option<Target>, AppError> {
        let Some(mut target) = self.get_target(owner_id, target_id).await? else {
            return Ok(None);
        };
        target.apply(change);
        self.write_target(&target, change).await
    }

    /// Target counterpart of [`Self::write_resolution`].
    pub async fn write_target(
        &self,
        target: &Target,
        change: &TargetChange,
    ) -> Result<Option<Target>, AppError> {
        let fields = match change {
            TargetChange::Completion(_) => firestore::paths!(Target::{is_completed}),
            TargetChange::Title(_) => firestore::paths!(Target::{title}),
        };

        let updated: Result<Target, FirestoreError> = self
            .client
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::TARGETS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .document_id(&target.id)
            .object(target)
            .execute()
            .await;

        not_found_as_none(updated)
    }

    pub async fn delete_target(&self, owner_id: &str, target_id: &str) -> Result<bool, AppError> {
        if self.get_target(owner_id, target_id).await?.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::TARGETS, target_id).await?;
        Ok(true)
    }

    // ─── Helper Methods ────────────────────────────────────────────

    async fn delete_doc(&self, collection: &str, doc_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(db_err)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = self
                .client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                self.client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}
