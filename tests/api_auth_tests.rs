// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session guard and CORS tests.
//!
//! These tests verify that:
//! 1. API routes answer 401 without a valid token
//! 2. Protected views redirect to login before loading anything
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

mod common;

/// Token with arbitrary audience and expiry, signed with the test secret.
fn custom_jwt(sub: &str, aud: &str, exp_offset: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        aud: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: sub.to_string(),
        aud: aud.to_string(),
        exp: (now + exp_offset) as usize,
        iat: now as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"test_jwt_key_32_bytes_minimum!!"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_api_without_token() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/years")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["details"], "Authentication required");
}

#[tokio::test]
async fn test_api_rejects_bad_tokens() {
    let (app, _) = common::create_test_app();

    let bad_tokens = [
        "not-a-jwt".to_string(),
        custom_jwt("acct", "someone-else", 3600),
        custom_jwt("acct", "authenticated", -3600),
        custom_jwt("", "authenticated", 3600),
    ];

    for token in bad_tokens {
        let response = common::send(&app, "GET", "/api/years", &token, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "token {token}");
        assert_eq!(common::body_json(response).await["error"], "invalid_token");
    }
}

#[tokio::test]
async fn test_api_with_valid_token() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", Some("a@example.com"));

    let response = common::send(&app, "GET", "/api/years", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/years")
                .header(header::COOKIE, format!("rt_session={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stale_cookie_falls_back_to_bearer() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/years")
                .header(header::COOKIE, "rt_session=expired.garbage.token")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_views_redirect_to_login() {
    let (app, _) = common::create_test_app();

    for uri in ["/dashboard", "/dashboard/year/anything"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/auth/login");
    }
}

#[tokio::test]
async fn test_landing_redirects_signed_in_visitors() {
    let (app, _) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["view"], "landing");

    let token = common::create_test_jwt("acct-1", None);
    let response = common::send(&app, "GET", "/", &token, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/dashboard");
}

#[tokio::test]
async fn test_dashboard_includes_email() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("acct-1", Some("a@example.com"));

    let response = common::send(&app, "GET", "/dashboard", &token, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );

    let body = common::body_json(response).await;
    assert_eq!(body["email"], "a@example.com");
    assert_eq!(body["years"], serde_json::json!([]));
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/years")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_foreign_origin() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/years")
                .header(header::ORIGIN, "https://evil.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
