// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, sign-up, OAuth and sign-out routes.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{current_session, LOGIN_PATH, SESSION_COOKIE};
use crate::services::auth::{self, AuthEventKind, ProviderSession, SignUpOutcome};
use crate::validation::SignUpForm;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Cookie holding the PKCE verifier between authorize and callback.
pub const PKCE_COOKIE: &str = "rt_pkce";
const CALLBACK_PATH: &str = "/auth/callback";
const DEFAULT_NEXT: &str = "/dashboard";
const PKCE_COOKIE_MAX_AGE_SECS: i64 = 10 * 60;
/// Signed `next` values older than this are ignored.
const OAUTH_STATE_MAX_AGE_MS: i64 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", get(login_view).post(login))
        .route("/auth/signup", get(signup_view).post(signup))
        .route("/auth/oauth/google", get(oauth_google))
        .route(CALLBACK_PATH, get(oauth_callback))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(get_session))
}

// ─── Cookies ─────────────────────────────────────────────────

fn session_cookie(config: &Config, session: &ProviderSession) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_https())
        .max_age(time::Duration::seconds(session.expires_in.max(0)))
        .build()
}

fn pkce_cookie(config: &Config, verifier: String) -> Cookie<'static> {
    Cookie::build((PKCE_COOKIE, verifier))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.is_https())
        .max_age(time::Duration::seconds(PKCE_COOKIE_MAX_AGE_SECS))
        .build()
}

/// Removal cookies must carry the same path as the originals.
fn removal_cookie(name: &'static str, path: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path(path).build()
}

// ─── Views ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct LoginView {
    pub view: &'static str,
    /// Message passed back from a failed OAuth callback.
    pub error: Option<String>,
    pub oauth_providers: Vec<&'static str>,
}

#[derive(Deserialize)]
pub struct LoginViewParams {
    #[serde(default)]
    error: Option<String>,
}

async fn login_view(Query(params): Query<LoginViewParams>) -> Json<LoginView> {
    Json(LoginView {
        view: "login",
        error: params.error,
        oauth_providers: vec!["google"],
    })
}

#[derive(Serialize)]
pub struct SignUpView {
    pub view: &'static str,
    pub oauth_providers: Vec<&'static str>,
}

async fn signup_view() -> Json<SignUpView> {
    Json(SignUpView {
        view: "signup",
        oauth_providers: vec!["google"],
    })
}

// ─── Password Flows ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Result of a successful sign-in or sign-up.
#[derive(Serialize)]
pub struct AuthResponse {
    pub account_id: String,
    pub email: Option<String>,
    /// True when the account must confirm its email before signing in.
    pub verification_required: bool,
    pub redirect_to: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let session = state
        .auth
        .client
        .sign_in_with_password(body.email.trim(), &body.password)
        .await?;

    tracing::info!(account_id = %session.user.id, "Password sign-in succeeded");
    state.auth.publish(
        AuthEventKind::SignedIn,
        &session.user.id,
        session.user.email.as_deref(),
    );

    let response = AuthResponse {
        account_id: session.user.id.clone(),
        email: session.user.email.clone(),
        verification_required: false,
        redirect_to: DEFAULT_NEXT.to_string(),
    };
    Ok((jar.add(session_cookie(&state.config, &session)), Json(response)))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(form): Json<SignUpForm>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    // Form errors never reach the provider
    form.check()?;

    let outcome = state
        .auth
        .client
        .sign_up(
            form.email.trim(),
            &form.password,
            &state.config.signup_redirect_url,
        )
        .await?;

    let user = outcome.user();
    tracing::info!(account_id = %user.id, "Account signed up");
    state
        .auth
        .publish(AuthEventKind::SignedUp, &user.id, user.email.as_deref());

    let response = AuthResponse {
        account_id: user.id.clone(),
        email: user.email.clone(),
        verification_required: matches!(outcome, SignUpOutcome::PendingVerification(_)),
        redirect_to: DEFAULT_NEXT.to_string(),
    };

    let jar = match &outcome {
        SignUpOutcome::Session(session) => jar.add(session_cookie(&state.config, session)),
        SignUpOutcome::PendingVerification(_) => jar,
    };
    Ok((jar, Json(response)))
}

// ─── OAuth ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OAuthStartParams {
    /// Relative path to land on after sign-in.
    #[serde(default)]
    next: Option<String>,
}

/// Start Google sign-in: stash a PKCE verifier and send the browser to the
/// provider.
async fn oauth_google(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<OAuthStartParams>,
) -> Result<(CookieJar, Redirect)> {
    let next = safe_next_path(params.next.as_deref());
    let signed_next = sign_next(&next, &state.config.oauth_state_key, now_millis())?;

    let verifier = auth::generate_code_verifier()?;
    let challenge = auth::code_challenge(&verifier);

    let callback_url = format!(
        "{}{}?next={}",
        state.config.public_url,
        CALLBACK_PATH,
        urlencoding::encode(&signed_next)
    );
    let authorize_url = state
        .auth
        .client
        .authorize_url("google", &callback_url, &challenge);

    tracing::info!(next = %next, "Starting OAuth flow, redirecting to provider");

    Ok((
        jar.add(pkce_cookie(&state.config, verifier)),
        Redirect::temporary(&authorize_url),
    ))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

fn login_error_redirect(message: &str) -> Redirect {
    Redirect::to(&format!(
        "{}?error={}",
        LOGIN_PATH,
        urlencoding::encode(message)
    ))
}

/// OAuth callback: exchange the code for a session.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let next = params
        .next
        .as_deref()
        .and_then(|signed| {
            verify_next(signed, &state.config.oauth_state_key, now_millis()).or_else(|| {
                tracing::warn!("Invalid or expired OAuth state, using default redirect");
                None
            })
        })
        .unwrap_or_else(|| DEFAULT_NEXT.to_string());

    let verifier = jar.get(PKCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal_cookie(PKCE_COOKIE, CALLBACK_PATH));

    if let Some(error) = params.error {
        let message = params.error_description.unwrap_or(error);
        tracing::warn!(error = %message, "OAuth error from provider");
        return (jar, login_error_redirect(&message));
    }

    let (code, verifier) = match (params.code, verifier) {
        (Some(code), Some(verifier)) => (code, verifier),
        (None, _) => return (jar, login_error_redirect("Missing authorization code")),
        (_, None) => return (jar, login_error_redirect("Sign-in session expired, please try again")),
    };

    match state.auth.client.exchange_code(&code, &verifier).await {
        Ok(session) => {
            tracing::info!(account_id = %session.user.id, "OAuth sign-in succeeded");
            state.auth.publish(
                AuthEventKind::SignedIn,
                &session.user.id,
                session.user.email.as_deref(),
            );
            (
                jar.add(session_cookie(&state.config, &session)),
                Redirect::to(&next),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "OAuth code exchange failed");
            (jar, login_error_redirect(&e.user_message()))
        }
    }
}

/// Accept only same-origin relative paths.
fn safe_next_path(next: Option<&str>) -> String {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://") =>
        {
            path.to_string()
        }
        _ => DEFAULT_NEXT.to_string(),
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Sign `next` with a timestamp: base64("path|timestamp_hex|signature_hex").
fn sign_next(next: &str, secret: &[u8], now_ms: i64) -> Result<String> {
    let payload = format!("{}|{:x}", next, now_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify a signed `next` and return the path if authentic and fresh.
fn verify_next(state: &str, secret: &[u8], now_ms: i64) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Split from the right so the path itself may contain '|'
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let next = parts.next()?;

    let payload = format!("{}|{}", next, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = i64::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_ms) > OAUTH_STATE_MAX_AGE_MS {
        return None;
    }

    Some(safe_next_path(Some(next)))
}

// ─── Session ─────────────────────────────────────────────────

/// Sign out: revoke at the provider (best effort), clear cookies, go home.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Response {
    let session = current_session(&state, &jar, &headers);

    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        if let Err(e) = state.auth.client.sign_out(&token).await {
            tracing::warn!(error = %e, "Provider sign-out failed, clearing session anyway");
        }
    }

    if let Some(session) = session {
        state.auth.publish(
            AuthEventKind::SignedOut,
            &session.account_id,
            session.email.as_deref(),
        );
    }

    let jar = jar
        .remove(removal_cookie(SESSION_COOKIE, "/"))
        .remove(removal_cookie(PKCE_COOKIE, CALLBACK_PATH));
    (jar, Redirect::to("/")).into_response()
}

#[derive(Serialize)]
pub struct SessionInfo {
    pub account_id: String,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session: Option<SessionInfo>,
}

/// Current session, or null.
async fn get_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let session = current_session(&state, &jar, &headers).map(|s| SessionInfo {
        account_id: s.account_id,
        email: s.email,
    });
    Json(SessionResponse { session })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"secret_key";
    const NOW: i64 = 1_767_225_600_000;

    #[test]
    fn test_signed_next_round_trip() {
        let signed = sign_next("/dashboard/year/abc", KEY, NOW).unwrap();
        assert_eq!(
            verify_next(&signed, KEY, NOW + 1000),
            Some("/dashboard/year/abc".to_string())
        );
    }

    #[test]
    fn test_signed_next_wrong_secret() {
        let signed = sign_next("/dashboard", KEY, NOW).unwrap();
        assert_eq!(verify_next(&signed, b"wrong_key", NOW), None);
    }

    #[test]
    fn test_signed_next_expired() {
        let signed = sign_next("/dashboard", KEY, NOW).unwrap();
        assert_eq!(
            verify_next(&signed, KEY, NOW + OAUTH_STATE_MAX_AGE_MS + 1),
            None
        );
    }

    #[test]
    fn test_signed_next_tampered() {
        let signed = sign_next("/dashboard", KEY, NOW).unwrap();
        let decoded = String::from_utf8(URL_SAFE_NO_PAD.decode(&signed).unwrap()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(decoded.replacen("/dashboard", "/evil", 1));
        assert_eq!(verify_next(&forged, KEY, NOW), None);

        let malformed = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_next(&malformed, KEY, NOW), None);
    }

    #[test]
    fn test_safe_next_path() {
        assert_eq!(safe_next_path(Some("/dashboard/year/1")), "/dashboard/year/1");
        assert_eq!(safe_next_path(None), "/dashboard");
        assert_eq!(safe_next_path(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_next_path(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_next_path(Some("/\\evil.example")), "/dashboard");
    }
}
