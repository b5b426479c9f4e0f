// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use resolution_tracker::config::Config;
use resolution_tracker::db::RecordStore;
use resolution_tracker::middleware::auth::create_jwt;
use resolution_tracker::routes::create_router;
use resolution_tracker::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> RecordStore {
    RecordStore::firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build an app over the given store and config.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, db: RecordStore) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Create a test app over a fresh in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), RecordStore::in_memory())
}

/// Create a test app whose store is unreachable.
#[allow(dead_code)]
pub fn create_test_app_offline() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), RecordStore::new_mock())
}

/// Mint an access token the test config accepts.
#[allow(dead_code)]
pub fn create_test_jwt(account_id: &str, email: Option<&str>) -> String {
    let config = Config::test_default();
    create_jwt(
        account_id,
        email,
        &config.auth_jwt_audience,
        &config.auth_jwt_secret,
    )
    .expect("Failed to create JWT")
}

/// Send one request with a bearer token and an optional JSON body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
