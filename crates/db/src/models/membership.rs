//! Membership model: a talent record's place on a production.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use casting_core::types::{DbId, Timestamp};

/// A row from the `memberships` table. Unique on `(production_id, talent_id)`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Membership {
    pub id: DbId,
    pub production_id: DbId,
    pub talent_id: DbId,
    pub role: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a membership.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMembership {
    pub talent_id: DbId,
    pub role: Option<String>,
    pub notes: Option<String>,
}
