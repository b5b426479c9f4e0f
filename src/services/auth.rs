// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted auth provider client (GoTrue-compatible REST API).
//!
//! Handles:
//! - Password sign-in and sign-up (with verification redirect)
//! - OAuth authorize URLs and PKCE code exchange
//! - Sign-out
//! - Publishing auth state changes to in-process subscribers

use crate::error::AppError;
use axum::http::StatusCode;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const PKCE_VERIFIER_BYTES: usize = 32;

/// Auth provider REST client.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// Account as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session returned by token grants.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    pub user: ProviderUser,
}

/// Sign-up answers with a session when email confirmation is disabled and
/// with the bare user otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    Session(ProviderSession),
    PendingVerification(ProviderUser),
}

impl SignUpOutcome {
    pub fn user(&self) -> &ProviderUser {
        match self {
            SignUpOutcome::Session(session) => &session.user,
            SignUpOutcome::PendingVerification(user) => user,
        }
    }
}

/// Error body shapes used by GoTrue across versions.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, AppError> {
        let url = format!("{}/token?grant_type=password", self.base_url);
        let body = serde_json::json!({ "email": email, "password": password });
        self.post_json(&url, &body).await
    }

    /// Register a new account. The verification email links to `redirect_to`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
    ) -> Result<SignUpOutcome, AppError> {
        let url = format!(
            "{}/signup?redirect_to={}",
            self.base_url,
            urlencoding::encode(redirect_to)
        );
        let body = serde_json::json!({ "email": email, "password": password });
        self.post_json(&url, &body).await
    }

    /// Browser redirect target for OAuth sign-in with PKCE.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        format!(
            "{}/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            self.base_url,
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        )
    }

    /// Exchange an OAuth authorization code for a session.
    pub async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<ProviderSession, AppError> {
        let url = format!("{}/token?grant_type=pkce", self.base_url);
        let body = serde_json::json!({
            "auth_code": auth_code,
            "code_verifier": code_verifier,
        });
        self.post_json(&url, &body).await
    }

    /// Revoke the session behind `access_token`.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let url = format!("{}/logout", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::AuthUnavailable(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(response).await)
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::AuthUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AuthUnavailable(format!("JSON parse error: {}", e)))
    }

    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        provider_error(status, &body)
    }
}

/// Map a failed provider response to an error carrying its user-facing message.
fn provider_error(status: StatusCode, body: &str) -> AppError {
    if status.is_server_error() {
        return AppError::AuthUnavailable(format!("HTTP {}: {}", status, body));
    }

    let message = serde_json::from_str::<ProviderErrorBody>(body)
        .ok()
        .and_then(ProviderErrorBody::into_message)
        .unwrap_or_else(|| "Authentication failed".to_string());

    AppError::AuthProvider { status, message }
}

// ─── PKCE ────────────────────────────────────────────────────

/// Random PKCE code verifier (43 URL-safe characters).
pub fn generate_code_verifier() -> Result<String, AppError> {
    let mut bytes = [0u8; PKCE_VERIFIER_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// S256 code challenge for a verifier.
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

// ─── Auth State Changes ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    SignedUp,
    SignedIn,
    SignedOut,
}

/// An auth state change, published after the provider call succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub account_id: String,
    pub email: Option<String>,
}

/// Auth provider client plus the auth state change stream.
#[derive(Clone)]
pub struct AuthService {
    pub client: AuthClient,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthService {
    pub fn new(client: AuthClient) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { client, events }
    }

    /// Subscribe to auth state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn publish(&self, kind: AuthEventKind, account_id: &str, email: Option<&str>) {
        // No subscribers is fine.
        let _ = self.events.send(AuthEvent {
            kind,
            account_id: account_id.to_string(),
            email: email.map(str::to_string),
        });
    }
}

/// Log every auth state change until the stream closes.
pub async fn log_auth_events(mut events: broadcast::Receiver<AuthEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::info!(
                kind = ?event.kind,
                account_id = %event.account_id,
                "Auth state changed"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Auth event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message_extraction() {
        let err = provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        match err {
            AppError::AuthProvider { status, message } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = provider_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"msg":"User already registered"}"#,
        );
        assert_eq!(err.to_string(), "User already registered");

        let err = provider_error(StatusCode::BAD_REQUEST, "not json");
        assert_eq!(err.to_string(), "Authentication failed");
    }

    #[test]
    fn test_server_errors_are_unavailable() {
        let err = provider_error(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert!(matches!(err, AppError::AuthUnavailable(_)));
    }

    #[test]
    fn test_sign_up_outcome_shapes() {
        let pending: SignUpOutcome =
            serde_json::from_str(r#"{"id":"u1","email":"a@example.com","aud":"authenticated"}"#)
                .unwrap();
        assert!(matches!(pending, SignUpOutcome::PendingVerification(_)));
        assert_eq!(pending.user().id, "u1");

        let session: SignUpOutcome = serde_json::from_str(
            r#"{"access_token":"t","token_type":"bearer","expires_in":3600,
                "refresh_token":"r","user":{"id":"u2","email":"b@example.com"}}"#,
        )
        .unwrap();
        assert!(matches!(session, SignUpOutcome::Session(_)));
        assert_eq!(session.user().id, "u2");
    }

    #[test]
    fn test_pkce_challenge() {
        // RFC 7636 appendix B
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
        let verifier = generate_code_verifier().unwrap();
        assert_eq!(verifier.len(), 43);
        assert_ne!(verifier, generate_code_verifier().unwrap());
    }

    #[test]
    fn test_authorize_url() {
        let client = AuthClient::new("https://auth.example.com/auth/v1/", "anon");
        let url = client.authorize_url("google", "http://localhost:8080/auth/callback", "abc");
        assert_eq!(
            url,
            "https://auth.example.com/auth/v1/authorize?provider=google\
             &redirect_to=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback\
             &code_challenge=abc&code_challenge_method=s256"
        );
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let service = AuthService::new(AuthClient::new("http://127.0.0.1:9", "anon"));
        let mut rx = service.subscribe();

        service.publish(AuthEventKind::SignedIn, "acct-1", Some("a@example.com"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(event.account_id, "acct-1");
    }
}
