// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets for the hosted auth provider are injected as environment variables
//! by the deployment, so everything is read once at startup.

use std::env;

/// Which record store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Firestore (or the emulator when `FIRESTORE_EMULATOR_HOST` is set)
    Firestore,
    /// Process-local store, for development only
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid("STORE_BACKEND", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Base URL of the hosted auth REST API (e.g. `https://x.supabase.co/auth/v1`)
    pub auth_url: String,
    /// Public (anon) API key sent with every auth request
    pub auth_anon_key: String,
    /// Expected `aud` claim of provider-issued access tokens
    pub auth_jwt_audience: String,
    /// Public URL of this service, used to build redirect targets
    pub public_url: String,
    /// Where the sign-up verification email sends the user
    pub signup_redirect_url: String,
    /// Record store backend
    pub store_backend: StoreBackend,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Secret the auth provider signs access tokens with (HS256)
    pub auth_jwt_secret: Vec<u8>,
    /// HMAC key for signing the OAuth `next` state
    pub oauth_state_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self::test_default()
    }
}

impl Config {
    /// Deterministic configuration used by tests.
    pub fn test_default() -> Self {
        Self {
            auth_url: "http://127.0.0.1:9/auth/v1".to_string(),
            auth_anon_key: "test_anon_key".to_string(),
            auth_jwt_audience: "authenticated".to_string(),
            public_url: "http://localhost:8080".to_string(),
            signup_redirect_url: "http://localhost:8080/dashboard".to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            auth_jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let public_url = env::var("PUBLIC_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let auth_jwt_secret = env::var("AUTH_JWT_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("AUTH_JWT_SECRET"))?
            .into_bytes();

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(v) => v.parse()?,
            Err(_) => StoreBackend::Firestore,
        };

        Ok(Self {
            auth_url: env::var("AUTH_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("AUTH_URL"))?,
            auth_anon_key: env::var("AUTH_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("AUTH_ANON_KEY"))?,
            auth_jwt_audience: env::var("AUTH_JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".to_string()),
            signup_redirect_url: env::var("SIGNUP_REDIRECT_URL")
                .unwrap_or_else(|_| format!("{}/dashboard", public_url)),
            public_url,
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map(|v| v.trim().to_string().into_bytes())
                .unwrap_or_else(|_| auth_jwt_secret.clone()),
            auth_jwt_secret,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn is_https(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
