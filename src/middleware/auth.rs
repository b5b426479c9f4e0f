// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session guard middleware.
//!
//! The auth provider issues HS256 access tokens signed with the project's
//! JWT secret. Sessions are verified on every request, nothing is cached.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie holding the provider access token.
pub const SESSION_COOKIE: &str = "rt_session";

/// Where protected views send visitors without a session.
pub const LOGIN_PATH: &str = "/auth/login";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Account email, if the provider includes it
    #[serde(default)]
    pub email: Option<String>,
    /// Audience
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated session extracted from the access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: String,
    pub email: Option<String>,
}

/// Decode and verify an access token.
pub fn verify_token(token: &str, secret: &[u8], audience: &str) -> Option<Session> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    if token_data.claims.sub.is_empty() {
        return None;
    }

    Some(Session {
        account_id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?
        .strip_prefix("Bearer ")
}

/// Resolve the current session: cookie first, then `Authorization: Bearer`.
///
/// A cookie that fails verification does not hide a valid bearer token.
pub fn current_session(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> Option<Session> {
    authenticate(state, jar, headers).ok()
}

fn authenticate(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Session, AppError> {
    let verify = |token: &str| {
        verify_token(
            token,
            &state.config.auth_jwt_secret,
            &state.config.auth_jwt_audience,
        )
    };

    let cookie = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let bearer = bearer_token(headers);
    if cookie.is_none() && bearer.is_none() {
        return Err(AppError::Unauthorized);
    }

    cookie
        .as_deref()
        .and_then(verify)
        .or_else(|| bearer.and_then(verify))
        .ok_or(AppError::InvalidToken)
}

/// Middleware for JSON API routes: 401 without a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = authenticate(&state, &jar, request.headers())?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Middleware for protected views: redirect to login without a valid session,
/// before any data is loaded.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match current_session(&state, &jar, request.headers()) {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "No session, redirecting to login");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

/// Create an access token in the provider's format. Used by tests and local
/// development tooling.
pub fn create_jwt(
    account_id: &str,
    email: Option<&str>,
    audience: &str,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: account_id.to_string(),
        email: email.map(str::to_string),
        aud: audience.to_string(),
        iat: now,
        exp: now + 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
