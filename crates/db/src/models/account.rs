//! Account and talent record models.
//!
//! Accounts and talent records are created by the registration flow; the
//! reconciliation engine only reads them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use casting_core::types::{DbId, Timestamp};

/// Account role for talent sign-ups.
pub const ROLE_TALENT: &str = "talent";
/// Account role for studio staff.
pub const ROLE_STUDIO: &str = "studio";

/// A row from the `accounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: DbId,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
}

/// A row from the `talent_records` table. One per talent account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TalentRecord {
    pub id: DbId,
    pub account_id: DbId,
    pub display_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a talent record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTalentRecord {
    pub account_id: DbId,
    pub display_name: String,
}
