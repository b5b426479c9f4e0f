// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Target collection tests.

use axum::http::StatusCode;
use serde_json::json;

mod common;

/// Create a year with one resolution and return the resolution id.
async fn create_resolution(app: &axum::Router, token: &str) -> String {
    let years = common::body_json(
        common::send(app, "POST", "/api/years", token, Some(json!({"year_number": 2025}))).await,
    )
    .await;
    let year_id = years[0]["id"].as_str().unwrap().to_string();

    let list = common::body_json(
        common::send(
            app,
            "POST",
            &format!("/api/years/{year_id}/resolutions"),
            token,
            Some(json!({"title": "Exercise"})),
        )
        .await,
    )
    .await;
    list["resolutions"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_no_targets_hides_progress() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);
    let resolution_id = create_resolution(&app, &token).await;

    let response = common::send(
        &app,
        "GET",
        &format!("/api/resolutions/{resolution_id}/targets"),
        &token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let list = common::body_json(response).await;
    assert_eq!(list["resolution_id"], resolution_id);
    assert_eq!(list["targets"], json!([]));
    assert_eq!(list["progress"], serde_json::Value::Null);
    assert_eq!(list["summary"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_one_of_two_completed() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);
    let resolution_id = create_resolution(&app, &token).await;
    let uri = format!("/api/resolutions/{resolution_id}/targets");

    common::send(&app, "POST", &uri, &token, Some(json!({"title": "Run 5k"}))).await;
    let list = common::body_json(
        common::send(&app, "POST", &uri, &token, Some(json!({"title": "Run 10k"}))).await,
    )
    .await;
    assert_eq!(list["targets"][0]["title"], "Run 5k");
    assert_eq!(list["targets"][1]["title"], "Run 10k");
    assert_eq!(list["summary"], "0 / 2 targets completed (0%)");

    let first_id = list["targets"][0]["id"].as_str().unwrap().to_string();
    let response = common::send(
        &app,
        "POST",
        &format!("/api/targets/{first_id}/toggle"),
        &token,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let list = common::body_json(response).await;
    assert_eq!(list["targets"][0]["is_completed"], true);
    assert_eq!(list["targets"][1]["is_completed"], false);
    assert_eq!(list["progress"]["percentage"], 50);
    assert_eq!(list["summary"], "1 / 2 targets completed (50%)");

    // The resolution's own flag is independent of its targets
    let resolution = state
        .db
        .get_resolution("acct-1", &resolution_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!resolution.is_completed);
}

#[tokio::test]
async fn test_completing_all_targets_leaves_resolution_open() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);
    let resolution_id = create_resolution(&app, &token).await;

    let list = common::body_json(
        common::send(
            &app,
            "POST",
            &format!("/api/resolutions/{resolution_id}/targets"),
            &token,
            Some(json!({"title": "Only"})),
        )
        .await,
    )
    .await;
    let target_id = list["targets"][0]["id"].as_str().unwrap().to_string();

    let list = common::body_json(
        common::send(&app, "POST", &format!("/api/targets/{target_id}/toggle"), &token, None)
            .await,
    )
    .await;
    assert_eq!(list["summary"], "1 / 1 targets completed (100%)");

    let resolution = state
        .db
        .get_resolution("acct-1", &resolution_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!resolution.is_completed);
}

#[tokio::test]
async fn test_rename_and_delete() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);
    let resolution_id = create_resolution(&app, &token).await;

    let list = common::body_json(
        common::send(
            &app,
            "POST",
            &format!("/api/resolutions/{resolution_id}/targets"),
            &token,
            Some(json!({"title": "Draft"})),
        )
        .await,
    )
    .await;
    let target_id = list["targets"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/targets/{target_id}");

    let response = common::send(&app, "PATCH", &uri, &token, Some(json!({"title": "  "}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        common::body_json(response).await["details"],
        "Target title is required"
    );

    let list = common::body_json(
        common::send(&app, "PATCH", &uri, &token, Some(json!({"title": "Final"}))).await,
    )
    .await;
    assert_eq!(list["targets"][0]["title"], "Final");

    let response = common::send(&app, "DELETE", &uri, &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let list = common::body_json(response).await;
    assert_eq!(list["targets"], json!([]));
    assert_eq!(list["progress"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_targets_of_unknown_resolution() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);

    let response = common::send(
        &app,
        "POST",
        "/api/resolutions/missing/targets",
        &token,
        Some(json!({"title": "Orphan"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
