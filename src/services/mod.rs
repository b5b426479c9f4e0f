// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod in_flight;
pub mod resolutions;
pub mod targets;
pub mod years;

use crate::error::{AppError, Result};

pub use auth::{AuthClient, AuthEvent, AuthEventKind, AuthService};
pub use in_flight::{InFlightActions, InFlightGuard};
pub use resolutions::{ResolutionController, ResolutionInput, ResolutionList};
pub use targets::{TargetController, TargetInput, TargetList};
pub use years::YearController;

/// Collection reads degrade to an empty list when the store fails.
/// Other errors (not-found, auth) pass through.
pub(crate) fn read_or_empty<T>(result: Result<Vec<T>>, collection: &'static str) -> Result<Vec<T>> {
    match result {
        Err(AppError::Database(e)) => {
            tracing::error!(collection, error = %e, "Collection read failed, showing empty list");
            Ok(Vec::new())
        }
        other => other,
    }
}
