//! Shareable code model: routes anonymous submissions to a studio and,
//! optionally, a production.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use casting_core::types::{DbId, Timestamp};

/// A row from the `shareable_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareableCode {
    pub id: DbId,
    pub studio_id: DbId,
    pub production_id: Option<DbId>,
    pub code: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for issuing a shareable code.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShareableCode {
    pub studio_id: DbId,
    pub production_id: Option<DbId>,
    pub code: String,
}
