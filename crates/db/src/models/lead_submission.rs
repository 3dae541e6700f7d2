//! Lead submission models: guest applications captured through a shareable code.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use casting_core::lifecycle::{ReviewDecision, SubmissionStatus};
use casting_core::matching::validate_contact_email;
use casting_core::types::{DbId, Timestamp};

/// A row from the `lead_submissions` table.
///
/// `roster_entry_id` is set when the guest was recognized as an existing
/// roster member of the code's studio at submission time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeadSubmission {
    pub id: DbId,
    pub shareable_code_id: DbId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    #[sqlx(rename = "status_id")]
    #[sqlx(try_from = "i16")]
    pub status: SubmissionStatus,
    pub roster_entry_id: Option<DbId>,
    pub converted_talent_id: Option<DbId>,
    pub converted_account_id: Option<DbId>,
    pub converted_at: Option<Timestamp>,
    pub memberships_replayed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Guest submission body. Email and phone are normalized on insert.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLeadSubmission {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(custom(function = "validate_contact_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// Request body for the studio review endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSubmission {
    pub decision: ReviewDecision,
}
