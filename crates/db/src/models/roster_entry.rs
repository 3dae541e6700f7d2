//! Roster entry models: talent a studio knows before they sign up.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use casting_core::lifecycle::RosterStatus;
use casting_core::matching::validate_contact_email;
use casting_core::types::{DbId, Timestamp};

/// A row from the `roster_entries` table.
///
/// `status` decodes from `status_id`. The conversion columns are non-null
/// exactly when `status` is [`RosterStatus::Converted`]; the table's
/// `ck_roster_entries_conversion_linkage` constraint enforces this.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RosterEntry {
    pub id: DbId,
    pub studio_id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[sqlx(rename = "status_id")]
    #[sqlx(try_from = "i16")]
    pub status: RosterStatus,
    pub converted_talent_id: Option<DbId>,
    pub converted_account_id: Option<DbId>,
    pub converted_at: Option<Timestamp>,
    pub memberships_replayed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RosterEntry {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An active roster entry returned by the matching query, with its studio name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RosterMatch {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: RosterEntry,
    pub studio_name: String,
}

/// DTO for creating a roster entry. Email and phone are normalized on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRosterEntry {
    #[validate(length(min = 1, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "last_name is required"))]
    pub last_name: String,
    #[validate(custom(function = "validate_contact_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// DTO for studio-side edits.
///
/// Only names are editable. Email and phone are the matching keys and,
/// once converted, part of the entry's history; unknown fields are rejected
/// so an attempted contact edit fails instead of being silently dropped.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateRosterEntry {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
}

/// A row from the `roster_entry_productions` join table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RosterEntryProduction {
    pub id: DbId,
    pub roster_entry_id: DbId,
    pub production_id: DbId,
    pub role: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for associating a roster entry with a production.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRosterEntryProduction {
    pub production_id: DbId,
    pub role: Option<String>,
    pub notes: Option<String>,
}
