// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duplicate-submission guard for mutations.
//!
//! A second request for the same (account, action, record) while the first
//! is still running is rejected. Different actions never block each other.

use crate::error::AppError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

type ActionKey = (String, &'static str, String);

/// Registry of mutations currently in flight.
#[derive(Clone, Default)]
pub struct InFlightActions {
    active: Arc<DashMap<ActionKey, ()>>,
}

impl InFlightActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an action. The claim is released when the guard drops.
    pub fn begin(
        &self,
        account_id: &str,
        action: &'static str,
        record_id: &str,
    ) -> Result<InFlightGuard, AppError> {
        let key = (account_id.to_string(), action, record_id.to_string());

        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    account_id,
                    action,
                    record_id,
                    "Blocked duplicate submission"
                );
                Err(AppError::InFlight)
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightGuard {
                    active: self.active.clone(),
                    key,
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Held for the duration of one mutation.
pub struct InFlightGuard {
    active: Arc<DashMap<ActionKey, ()>>,
    key: ActionKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}
