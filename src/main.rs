// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resolution Tracker API Server
//!
//! Serves yearly resolutions and their targets for accounts signed in
//! through the hosted auth provider.

use resolution_tracker::{
    config::{Config, StoreBackend},
    db::RecordStore,
    services::auth::log_auth_events,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Resolution Tracker API");

    let db = match config.store_backend {
        StoreBackend::Firestore => RecordStore::firestore(&config.gcp_project_id).await?,
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, data is lost on restart");
            RecordStore::in_memory()
        }
    };
    tracing::info!(backend = db.backend_name(), "Record store initialized");

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db));

    // Audit log of sign-ins, sign-ups and sign-outs
    tokio::spawn(log_auth_events(state.auth.subscribe()));

    // Build router
    let app = resolution_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("resolution_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
