// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Year model: the top-level per-account container.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Year record stored in the `years` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Year {
    /// Document ID, derived from owner and year number
    pub id: String,
    /// Owning account
    pub owner_id: String,
    /// Calendar year, 2000–2100
    pub year_number: i32,
    /// When the year was created (RFC3339)
    pub created_at: String,
}

impl Year {
    pub fn new(owner_id: &str, year_number: i32, created_at: String) -> Self {
        Self {
            id: Self::document_id(owner_id, year_number),
            owner_id: owner_id.to_string(),
            year_number,
            created_at,
        }
    }

    /// One document per (owner, year number), which makes the store enforce
    /// uniqueness on insert.
    pub fn document_id(owner_id: &str, year_number: i32) -> String {
        format!("{}_{}", urlencoding::encode(owner_id), year_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_is_per_owner() {
        let a = Year::new("acct-a", 2025, String::new());
        let b = Year::new("acct-b", 2025, String::new());
        assert_eq!(a.id, "acct-a_2025");
        assert_ne!(a.id, b.id);
        assert_eq!(Year::document_id("x/y", 2030), "x%2Fy_2030");
    }
}
