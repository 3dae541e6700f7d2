//! Studio and production models.
//!
//! Both are owned by the surrounding application; only the fields the
//! reconciliation pipeline reads are modelled here.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use casting_core::types::{DbId, Timestamp};

/// A row from the `studios` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Studio {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a studio.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateStudio {
    #[validate(length(min = 1))]
    pub name: String,
}

/// A row from the `productions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Production {
    pub id: DbId,
    pub studio_id: DbId,
    pub title: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a production.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduction {
    pub studio_id: DbId,
    #[validate(length(min = 1))]
    pub title: String,
}
