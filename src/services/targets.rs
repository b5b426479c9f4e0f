// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Target collection controller, scoped to one resolution.
//!
//! Targets are only loaded on request, never alongside the resolution list.

use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::middleware::Session;
use crate::models::{Progress, Resolution, Target, TargetChange};
use crate::services::read_or_empty;
use crate::time_utils::now_rfc3339;
use crate::validation;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Deserialize)]
pub struct TargetInput {
    pub title: String,
}

/// A resolution's targets. Progress is omitted when there are none.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TargetList {
    pub resolution_id: String,
    pub targets: Vec<Target>,
    pub progress: Option<Progress>,
    /// "1 / 2 targets completed (50%)"
    pub summary: Option<String>,
}

pub struct TargetController<'a> {
    db: &'a RecordStore,
    session: &'a Session,
}

impl<'a> TargetController<'a> {
    pub fn new(db: &'a RecordStore, session: &'a Session) -> Self {
        Self { db, session }
    }

    fn owner(&self) -> &str {
        &self.session.account_id
    }

    async fn load_resolution(&self, resolution_id: &str) -> Result<Resolution> {
        self.db
            .get_resolution(self.owner(), resolution_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resolution {} not found", resolution_id)))
    }

    async fn load_target(&self, target_id: &str) -> Result<Target> {
        self.db
            .get_target(self.owner(), target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Target {} not found", target_id)))
    }

    /// Targets of a resolution in creation order.
    pub async fn list(&self, resolution_id: &str) -> Result<TargetList> {
        let resolution = self.load_resolution(resolution_id).await?;
        self.list_for(&resolution.id).await
    }

    async fn list_for(&self, resolution_id: &str) -> Result<TargetList> {
        let targets = read_or_empty(
            self.db.list_targets(self.owner(), resolution_id).await,
            "targets",
        )?;
        let progress = Progress::from_flags(targets.iter().map(|t| t.is_completed)).visible();

        Ok(TargetList {
            resolution_id: resolution_id.to_string(),
            summary: progress.map(|p| p.target_summary()),
            targets,
            progress,
        })
    }

    pub async fn create(&self, resolution_id: &str, input: &TargetInput) -> Result<TargetList> {
        let title = validation::target_title(&input.title)?;

        let resolution = self.load_resolution(resolution_id).await?;
        let target = Target::new(self.owner(), &resolution.id, title, now_rfc3339());
        self.db.insert_target(&target).await?;

        tracing::info!(
            account_id = %self.owner(),
            resolution_id = %resolution.id,
            target_id = %target.id,
            "Target created"
        );

        self.list_for(&resolution.id).await
    }

    /// Flip one target's completion flag; siblings and the resolution's own
    /// flag are untouched.
    pub async fn toggle(&self, target_id: &str) -> Result<TargetList> {
        let current = self.load_target(target_id).await?;
        self.apply(&current, TargetChange::Completion(!current.is_completed))
            .await
    }

    pub async fn update(&self, target_id: &str, input: &TargetInput) -> Result<TargetList> {
        let change = TargetChange::Title(validation::target_title(&input.title)?);
        let current = self.load_target(target_id).await?;
        self.apply(&current, change).await
    }

    async fn apply(&self, current: &Target, change: TargetChange) -> Result<TargetList> {
        self.db
            .update_target(self.owner(), &current.id, &change)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Target {} not found", current.id)))?;

        tracing::debug!(
            account_id = %self.owner(),
            target_id = %current.id,
            ?change,
            "Target updated"
        );

        self.list_for(&current.resolution_id).await
    }

    pub async fn delete(&self, target_id: &str) -> Result<TargetList> {
        let current = self.load_target(target_id).await?;
        self.db.delete_target(self.owner(), target_id).await?;

        tracing::debug!(account_id = %self.owner(), target_id, "Target deleted");

        self.list_for(&current.resolution_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolutions::{ResolutionController, ResolutionInput};
    use crate::services::years::YearController;
    use serde_json::json;

    async fn setup() -> (RecordStore, Session, String) {
        let db = RecordStore::in_memory();
        let session = Session {
            account_id: "acct".to_string(),
            email: None,
        };
        let year = YearController::new(&db, &session)
            .create(&json!(2025))
            .await
            .unwrap()
            .remove(0);
        let resolution_id = ResolutionController::new(&db, &session)
            .create(
                &year.id,
                &ResolutionInput {
                    title: "Exercise".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
            .resolutions
            .remove(0)
            .id;
        (db, session, resolution_id)
    }

    fn input(title: &str) -> TargetInput {
        TargetInput {
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_list_hides_progress() {
        let (db, session, resolution_id) = setup().await;
        let list = TargetController::new(&db, &session)
            .list(&resolution_id)
            .await
            .unwrap();

        assert!(list.targets.is_empty());
        assert_eq!(list.progress, None);
        assert_eq!(list.summary, None);
    }

    #[tokio::test]
    async fn test_toggle_one_of_two() {
        let (db, session, resolution_id) = setup().await;
        let controller = TargetController::new(&db, &session);

        controller.create(&resolution_id, &input("Run 5k")).await.unwrap();
        let list = controller
            .create(&resolution_id, &input("Run 10k"))
            .await
            .unwrap();
        assert_eq!(list.targets[0].title, "Run 5k");

        let first = list.targets[0].id.clone();
        let list = controller.toggle(&first).await.unwrap();

        assert!(list.targets[0].is_completed);
        assert!(!list.targets[1].is_completed);
        assert_eq!(
            list.summary.as_deref(),
            Some("1 / 2 targets completed (50%)")
        );

        let resolution = db
            .get_resolution("acct", &resolution_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!resolution.is_completed);
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let (db, session, resolution_id) = setup().await;
        let controller = TargetController::new(&db, &session);

        let list = controller.create(&resolution_id, &input("Draft")).await.unwrap();
        let id = list.targets[0].id.clone();

        let err = controller.update(&id, &input(" ")).await.unwrap_err();
        assert_eq!(err.to_string(), "Target title is required");

        let list = controller.update(&id, &input(" Final ")).await.unwrap();
        assert_eq!(list.targets[0].title, "Final");

        let list = controller.delete(&id).await.unwrap();
        assert!(list.targets.is_empty());
        assert!(matches!(
            controller.delete(&id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
