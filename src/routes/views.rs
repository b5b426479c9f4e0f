// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page views. Each returns the data its page renders.

use crate::error::AppError;
use crate::middleware::auth::current_session;
use crate::middleware::Session;
use crate::models::Year;
use crate::services::{ResolutionController, YearController};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use std::sync::Arc;

const DASHBOARD_PATH: &str = "/dashboard";

/// Shown by the offline fallback; it needs no scripts.
const OFFLINE_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'";

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline - Resolution Tracker</title>
<style>
body { font-family: system-ui, sans-serif; text-align: center; padding: 4rem 1rem; color: #333; }
button { font-size: 1rem; padding: 0.5rem 1.5rem; }
</style>
</head>
<body>
<h1>You're offline</h1>
<p>Resolution Tracker can't reach the server right now. Check your connection and try again.</p>
<form method="get"><button type="submit">Reload</button></form>
</body>
</html>
"#;

/// Views reachable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(landing))
        .route("/offline", get(offline))
}

/// Views behind the session guard.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(DASHBOARD_PATH, get(dashboard))
        .route("/dashboard/year/{year_id}", get(year_detail))
}

#[derive(Serialize)]
pub struct LandingView {
    pub view: &'static str,
    pub sign_in_path: &'static str,
    pub sign_up_path: &'static str,
}

/// Signed-in visitors go straight to the dashboard.
async fn landing(State(state): State<Arc<AppState>>, jar: CookieJar, headers: HeaderMap) -> Response {
    if current_session(&state, &jar, &headers).is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }
    Json(LandingView {
        view: "landing",
        sign_in_path: "/auth/login",
        sign_up_path: "/auth/signup",
    })
    .into_response()
}

async fn offline() -> impl IntoResponse {
    ([(header::CONTENT_SECURITY_POLICY, OFFLINE_CSP)], Html(OFFLINE_PAGE))
}

#[derive(Serialize)]
pub struct DashboardView {
    pub email: Option<String>,
    pub years: Vec<Year>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Response {
    match YearController::new(&state.db, &session).list().await {
        Ok(years) => Json(DashboardView {
            email: session.email.clone(),
            years,
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// A year's resolutions. Unknown or foreign years go back to the dashboard.
async fn year_detail(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(year_id): Path<String>,
) -> Response {
    match ResolutionController::new(&state.db, &session)
        .list(&year_id)
        .await
    {
        Ok(list) => Json(list).into_response(),
        Err(AppError::NotFound(_)) => {
            tracing::debug!(account_id = %session.account_id, year_id = %year_id, "Year not found");
            Redirect::to(DASHBOARD_PATH).into_response()
        }
        Err(e) => {
            tracing::error!(account_id = %session.account_id, year_id = %year_id, error = %e, "Failed to load year");
            Redirect::to(DASHBOARD_PATH).into_response()
        }
    }
}
