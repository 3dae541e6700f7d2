//! Repository for the `memberships` table.

use sqlx::PgPool;
use casting_core::types::DbId;

use crate::models::membership::{CreateMembership, Membership};

/// Column list for the `memberships` table.
const COLUMNS: &str = "id, production_id, talent_id, role, notes, created_at, updated_at";

pub struct MembershipRepo;

impl MembershipRepo {
    /// Studio-initiated assignment. Fails with a unique violation on
    /// `uq_memberships_production_talent` when the pair already exists.
    pub async fn create(
        pool: &PgPool,
        production_id: DbId,
        input: &CreateMembership,
        role: &str,
    ) -> Result<Membership, sqlx::Error> {
        let query = format!(
            "INSERT INTO memberships (production_id, talent_id, role, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(production_id)
            .bind(input.talent_id)
            .bind(role)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// Insert the membership unless the pair already exists.
    ///
    /// Uses `ON CONFLICT ON CONSTRAINT uq_memberships_production_talent DO
    /// NOTHING`, so concurrent callers can never produce a second row.
    /// Returns the new row, or `None` if a membership was already present.
    pub async fn insert_if_absent(
        pool: &PgPool,
        production_id: DbId,
        talent_id: DbId,
        role: &str,
        notes: Option<&str>,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let query = format!(
            "INSERT INTO memberships (production_id, talent_id, role, notes) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_memberships_production_talent DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(production_id)
            .bind(talent_id)
            .bind(role)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(
        pool: &PgPool,
        production_id: DbId,
        talent_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM memberships WHERE production_id = $1 AND talent_id = $2)",
        )
        .bind(production_id)
        .bind(talent_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    pub async fn list_for_talent(
        pool: &PgPool,
        talent_id: DbId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM memberships WHERE talent_id = $1 ORDER BY production_id ASC"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(talent_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_production(
        pool: &PgPool,
        production_id: DbId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM memberships WHERE production_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, Membership>(&query)
            .bind(production_id)
            .fetch_all(pool)
            .await
    }

    /// Remove a membership. Returns `true` if a row was deleted.
    pub async fn delete(
        pool: &PgPool,
        production_id: DbId,
        talent_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM memberships WHERE production_id = $1 AND talent_id = $2")
                .bind(production_id)
                .bind(talent_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
