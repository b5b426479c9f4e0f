// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON API routes for authenticated accounts.
//!
//! Every mutation answers with the refetched collection it changed.

use crate::error::Result;
use crate::middleware::Session;
use crate::models::Year;
use crate::services::{
    ResolutionController, ResolutionInput, ResolutionList, TargetController, TargetInput,
    TargetList, YearController,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/years", get(list_years).post(create_year))
        .route("/api/years/{year_id}", delete(delete_year))
        .route(
            "/api/years/{year_id}/resolutions",
            get(list_resolutions).post(create_resolution),
        )
        .route(
            "/api/resolutions/{resolution_id}",
            patch(update_resolution).delete(delete_resolution),
        )
        .route(
            "/api/resolutions/{resolution_id}/toggle",
            post(toggle_resolution),
        )
        .route(
            "/api/resolutions/{resolution_id}/targets",
            get(list_targets).post(create_target),
        )
        .route(
            "/api/targets/{target_id}",
            patch(update_target).delete(delete_target),
        )
        .route("/api/targets/{target_id}/toggle", post(toggle_target))
}

// ─── Years ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateYearRequest {
    /// Integer or numeric string, as typed.
    year_number: serde_json::Value,
}

async fn list_years(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<Year>>> {
    Ok(Json(YearController::new(&state.db, &session).list().await?))
}

async fn create_year(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(body): Json<CreateYearRequest>,
) -> Result<Json<Vec<Year>>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "create_year", "")?;
    let years = YearController::new(&state.db, &session)
        .create(&body.year_number)
        .await?;
    Ok(Json(years))
}

async fn delete_year(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(year_id): Path<String>,
) -> Result<Json<Vec<Year>>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "delete_year", &year_id)?;
    let years = YearController::new(&state.db, &session)
        .delete(&year_id)
        .await?;
    Ok(Json(years))
}

// ─── Resolutions ─────────────────────────────────────────────

async fn list_resolutions(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(year_id): Path<String>,
) -> Result<Json<ResolutionList>> {
    let list = ResolutionController::new(&state.db, &session)
        .list(&year_id)
        .await?;
    Ok(Json(list))
}

async fn create_resolution(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(year_id): Path<String>,
    Json(body): Json<ResolutionInput>,
) -> Result<Json<ResolutionList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "create_resolution", &year_id)?;
    let list = ResolutionController::new(&state.db, &session)
        .create(&year_id, &body)
        .await?;
    Ok(Json(list))
}

async fn update_resolution(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(resolution_id): Path<String>,
    Json(body): Json<ResolutionInput>,
) -> Result<Json<ResolutionList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "update_resolution", &resolution_id)?;
    let list = ResolutionController::new(&state.db, &session)
        .update(&resolution_id, &body)
        .await?;
    Ok(Json(list))
}

async fn toggle_resolution(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(resolution_id): Path<String>,
) -> Result<Json<ResolutionList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "toggle_resolution", &resolution_id)?;
    let list = ResolutionController::new(&state.db, &session)
        .toggle(&resolution_id)
        .await?;
    Ok(Json(list))
}

async fn delete_resolution(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(resolution_id): Path<String>,
) -> Result<Json<ResolutionList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "delete_resolution", &resolution_id)?;
    let list = ResolutionController::new(&state.db, &session)
        .delete(&resolution_id)
        .await?;
    Ok(Json(list))
}

// ─── Targets ─────────────────────────────────────────────────

/// Loaded on demand when a resolution is expanded.
async fn list_targets(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(resolution_id): Path<String>,
) -> Result<Json<TargetList>> {
    let list = TargetController::new(&state.db, &session)
        .list(&resolution_id)
        .await?;
    Ok(Json(list))
}

async fn create_target(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(resolution_id): Path<String>,
    Json(body): Json<TargetInput>,
) -> Result<Json<TargetList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "create_target", &resolution_id)?;
    let list = TargetController::new(&state.db, &session)
        .create(&resolution_id, &body)
        .await?;
    Ok(Json(list))
}

async fn update_target(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(target_id): Path<String>,
    Json(body): Json<TargetInput>,
) -> Result<Json<TargetList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "update_target", &target_id)?;
    let list = TargetController::new(&state.db, &session)
        .update(&target_id, &body)
        .await?;
    Ok(Json(list))
}

async fn toggle_target(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(target_id): Path<String>,
) -> Result<Json<TargetList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "toggle_target", &target_id)?;
    let list = TargetController::new(&state.db, &session)
        .toggle(&target_id)
        .await?;
    Ok(Json(list))
}

async fn delete_target(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(target_id): Path<String>,
) -> Result<Json<TargetList>> {
    let _guard = state
        .in_flight
        .begin(&session.account_id, "delete_target", &target_id)?;
    let list = TargetController::new(&state.db, &session)
        .delete(&target_id)
        .await?;
    Ok(Json(list))
}
