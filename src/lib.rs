// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Resolution Tracker: yearly resolutions broken down into targets
//!
//! This crate provides the backend for tracking resolutions per year,
//! with sessions issued by a hosted auth provider and records kept in
//! Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::RecordStore;
use services::{AuthService, InFlightActions};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: RecordStore,
    pub auth: AuthService,
    pub in_flight: InFlightActions,
}

impl AppState {
    pub fn new(config: Config, db: RecordStore) -> Self {
        let auth = AuthService::new(services::AuthClient::new(
            &config.auth_url,
            &config.auth_anon_key,
        ));
        Self {
            config,
            db,
            auth,
            in_flight: InFlightActions::new(),
        }
    }
}
