//! Repository for the `shareable_codes` table.

use sqlx::PgPool;
use casting_core::types::DbId;

use crate::models::shareable_code::{CreateShareableCode, ShareableCode};

/// Column list for the `shareable_codes` table.
const COLUMNS: &str = "id, studio_id, production_id, code, is_active, created_at, updated_at";

pub struct ShareableCodeRepo;

impl ShareableCodeRepo {
    /// Issue a new active code. Fails on `uq_shareable_codes_code` for duplicates.
    pub async fn create(
        pool: &PgPool,
        input: &CreateShareableCode,
    ) -> Result<ShareableCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO shareable_codes (studio_id, production_id, code) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ShareableCode>(&query)
            .bind(input.studio_id)
            .bind(input.production_id)
            .bind(input.code.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<ShareableCode>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM shareable_codes WHERE code = $1");
        sqlx::query_as::<_, ShareableCode>(&query)
            .bind(code.trim())
            .fetch_optional(pool)
            .await
    }

    /// Disable a code so it stops accepting submissions.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE shareable_codes SET is_active = false WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The production designated by the code a submission came through, if any.
    ///
    /// Returns `None` both when the submission is missing and when its code
    /// designates no production.
    pub async fn production_for_submission(
        pool: &PgPool,
        submission_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(Option<DbId>,)> = sqlx::query_as(
            "SELECT c.production_id \
             FROM lead_submissions ls \
             JOIN shareable_codes c ON c.id = ls.shareable_code_id \
             WHERE ls.id = $1",
        )
        .bind(submission_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.and_then(|(production_id,)| production_id))
    }
}
