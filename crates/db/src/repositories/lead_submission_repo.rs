//! Repository for the `lead_submissions` table.

use sqlx::PgPool;
use casting_core::lifecycle::SubmissionStatus;
use casting_core::matching::{normalize_optional_email, normalize_optional_phone};
use casting_core::types::DbId;

use crate::models::lead_submission::{CreateLeadSubmission, LeadSubmission};

/// Column list for the `lead_submissions` table.
const COLUMNS: &str = "id, shareable_code_id, name, email, phone, message, status_id, \
    roster_entry_id, converted_talent_id, converted_account_id, converted_at, \
    memberships_replayed_at, created_at, updated_at";

/// Column list for the `lead_submissions` table aliased as `ls` (used in JOIN queries).
const PREFIXED_COLUMNS: &str = "ls.id, ls.shareable_code_id, ls.name, ls.email, ls.phone, \
    ls.message, ls.status_id, ls.roster_entry_id, ls.converted_talent_id, \
    ls.converted_account_id, ls.converted_at, ls.memberships_replayed_at, \
    ls.created_at, ls.updated_at";

pub struct LeadSubmissionRepo;

impl LeadSubmissionRepo {
    /// Insert a pending submission received through a shareable code.
    pub async fn create(
        pool: &PgPool,
        shareable_code_id: DbId,
        roster_entry_id: Option<DbId>,
        input: &CreateLeadSubmission,
    ) -> Result<LeadSubmission, sqlx::Error> {
        let query = format!(
            "INSERT INTO lead_submissions \
                (shareable_code_id, name, email, phone, message, status_id, roster_entry_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(shareable_code_id)
            .bind(input.name.trim())
            .bind(normalize_optional_email(input.email.as_deref()))
            .bind(normalize_optional_phone(input.phone.as_deref()))
            .bind(input.message.as_deref().unwrap_or_default())
            .bind(SubmissionStatus::Pending.id())
            .bind(roster_entry_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LeadSubmission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lead_submissions WHERE id = $1");
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every submission received through any of a studio's codes, newest first.
    pub async fn list_for_studio(
        pool: &PgPool,
        studio_id: DbId,
    ) -> Result<Vec<LeadSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {PREFIXED_COLUMNS} \
             FROM lead_submissions ls \
             JOIN shareable_codes c ON c.id = ls.shareable_code_id \
             WHERE c.studio_id = $1 \
             ORDER BY ls.created_at DESC, ls.id DESC"
        );
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(studio_id)
            .fetch_all(pool)
            .await
    }

    /// Store a studio review decision.
    ///
    /// Returns `None` when the submission does not exist or has been
    /// converted in the meantime; conversion is terminal.
    pub async fn set_review_status(
        pool: &PgPool,
        id: DbId,
        status: SubmissionStatus,
    ) -> Result<Option<LeadSubmission>, sqlx::Error> {
        let query = format!(
            "UPDATE lead_submissions SET status_id = $2 \
             WHERE id = $1 AND status_id <> $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(id)
            .bind(status.id())
            .bind(SubmissionStatus::Converted.id())
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Conversion (transaction-scoped)
    // -----------------------------------------------------------------------

    /// Load a submission with a row lock held until the transaction ends.
    pub async fn lock_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<LeadSubmission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM lead_submissions WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Flip a pending or approved submission to converted and stamp the linkage.
    ///
    /// Returns `None` when the submission is no longer in a convertible state.
    pub async fn mark_converted(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        talent_id: DbId,
        account_id: DbId,
    ) -> Result<Option<LeadSubmission>, sqlx::Error> {
        let query = format!(
            "UPDATE lead_submissions SET \
                status_id = $4, \
                converted_talent_id = $2, \
                converted_account_id = $3, \
                converted_at = NOW() \
             WHERE id = $1 AND status_id = ANY($5) \
             RETURNING {COLUMNS}"
        );
        let convertible: Vec<i16> = SubmissionStatus::CONVERTIBLE
            .iter()
            .map(|s| s.id())
            .collect();
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(id)
            .bind(talent_id)
            .bind(account_id)
            .bind(SubmissionStatus::Converted.id())
            .bind(convertible)
            .fetch_optional(&mut **tx)
            .await
    }

    // -----------------------------------------------------------------------
    // Replay bookkeeping
    // -----------------------------------------------------------------------

    /// Record that the production implied by the submission's code has been
    /// replayed for the talent it converted to.
    pub async fn mark_replayed(
        pool: &PgPool,
        id: DbId,
        talent_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE lead_submissions SET memberships_replayed_at = NOW() \
             WHERE id = $1 AND converted_talent_id = $2 AND memberships_replayed_at IS NULL",
        )
        .bind(id)
        .bind(talent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Submissions converted to the talent whose membership replay never completed.
    pub async fn list_pending_replay(
        pool: &PgPool,
        talent_id: DbId,
    ) -> Result<Vec<LeadSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lead_submissions \
             WHERE converted_talent_id = $1 AND memberships_replayed_at IS NULL \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(talent_id)
            .fetch_all(pool)
            .await
    }

    /// Every submission converted to the talent, newest conversion first.
    pub async fn list_converted_for_talent(
        pool: &PgPool,
        talent_id: DbId,
    ) -> Result<Vec<LeadSubmission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lead_submissions \
             WHERE converted_talent_id = $1 \
             ORDER BY converted_at DESC, id DESC"
        );
        sqlx::query_as::<_, LeadSubmission>(&query)
            .bind(talent_id)
            .fetch_all(pool)
            .await
    }
}
