//! Repository for the `roster_entries` and `roster_entry_productions` tables.

use sqlx::PgPool;
use casting_core::lifecycle::RosterStatus;
use casting_core::matching::{normalize_optional_email, normalize_optional_phone, MatchCriteria};
use casting_core::types::DbId;

use crate::models::roster_entry::{
    CreateRosterEntry, CreateRosterEntryProduction, RosterEntry, RosterEntryProduction,
    RosterMatch, UpdateRosterEntry,
};

/// Column list for the `roster_entries` table.
const COLUMNS: &str = "id, studio_id, first_name, last_name, email, phone, status_id, \
    converted_talent_id, converted_account_id, converted_at, memberships_replayed_at, \
    created_at, updated_at";

/// Column list for the `roster_entries` table aliased as `e` (used in JOIN queries).
const PREFIXED_COLUMNS: &str = "e.id, e.studio_id, e.first_name, e.last_name, e.email, \
    e.phone, e.status_id, e.converted_talent_id, e.converted_account_id, e.converted_at, \
    e.memberships_replayed_at, e.created_at, e.updated_at";

/// Column list for the `roster_entry_productions` table.
const PRODUCTION_LINK_COLUMNS: &str =
    "id, roster_entry_id, production_id, role, notes, created_at, updated_at";

/// Matching predicate over `roster_entries e`: active only, email always,
/// phone only when `$2` is non-null.
const MATCH_PREDICATE: &str = "e.status_id = $3 \
    AND (LOWER(e.email) = $1 OR ($2::TEXT IS NOT NULL AND e.phone = $2))";

pub struct RosterEntryRepo;

impl RosterEntryRepo {
    /// Insert a new active roster entry. Email and phone are normalized.
    pub async fn create(
        pool: &PgPool,
        studio_id: DbId,
        input: &CreateRosterEntry,
    ) -> Result<RosterEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO roster_entries (studio_id, first_name, last_name, email, phone, status_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(studio_id)
            .bind(input.first_name.trim())
            .bind(input.last_name.trim())
            .bind(normalize_optional_email(input.email.as_deref()))
            .bind(normalize_optional_phone(input.phone.as_deref()))
            .bind(RosterStatus::Active.id())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RosterEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roster_entries WHERE id = $1");
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a studio's roster, optionally filtered by status, oldest first.
    pub async fn list_for_studio(
        pool: &PgPool,
        studio_id: DbId,
        status: Option<RosterStatus>,
    ) -> Result<Vec<RosterEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM roster_entries \
             WHERE studio_id = $1 AND ($2::SMALLINT IS NULL OR status_id = $2) \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(studio_id)
            .bind(status.map(RosterStatus::id))
            .fetch_all(pool)
            .await
    }

    /// Apply studio edits to the name fields. Contact details, status and
    /// conversion linkage are never touched here.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRosterEntry,
    ) -> Result<Option<RosterEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE roster_entries SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(id)
            .bind(input.first_name.as_deref().map(str::trim))
            .bind(input.last_name.as_deref().map(str::trim))
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    /// Active entries across all studios matching the criteria, with the
    /// owning studio's name. Converted entries are never returned.
    pub async fn find_active_matches(
        pool: &PgPool,
        criteria: &MatchCriteria,
    ) -> Result<Vec<RosterMatch>, sqlx::Error> {
        let query = format!(
            "SELECT {PREFIXED_COLUMNS}, s.name AS studio_name \
             FROM roster_entries e \
             JOIN studios s ON s.id = e.studio_id \
             WHERE {MATCH_PREDICATE} \
             ORDER BY e.id ASC"
        );
        sqlx::query_as::<_, RosterMatch>(&query)
            .bind(criteria.email())
            .bind(criteria.phone())
            .bind(RosterStatus::Active.id())
            .fetch_all(pool)
            .await
    }

    /// Same rule as [`find_active_matches`](Self::find_active_matches),
    /// restricted to one studio's roster.
    pub async fn find_active_matches_in_studio(
        pool: &PgPool,
        studio_id: DbId,
        criteria: &MatchCriteria,
    ) -> Result<Vec<RosterEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {PREFIXED_COLUMNS} \
             FROM roster_entries e \
             WHERE {MATCH_PREDICATE} AND e.studio_id = $4 \
             ORDER BY e.id ASC"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(criteria.email())
            .bind(criteria.phone())
            .bind(RosterStatus::Active.id())
            .bind(studio_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Conversion (transaction-scoped)
    // -----------------------------------------------------------------------

    /// Read an entry's status with a row lock held until the transaction ends.
    pub async fn lock_status(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<RosterStatus>, sqlx::Error> {
        let row: Option<(i16,)> =
            sqlx::query_as("SELECT status_id FROM roster_entries WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        row.map(|(status_id,)| {
            RosterStatus::try_from(status_id).map_err(|e| sqlx::Error::Decode(Box::new(e)))
        })
        .transpose()
    }

    /// Flip an active entry to converted and stamp the linkage.
    ///
    /// The `status_id` guard makes this a no-op (returns `None`) when the
    /// entry is no longer active.
    pub async fn mark_converted(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        talent_id: DbId,
        account_id: DbId,
    ) -> Result<Option<RosterEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE roster_entries SET \
                status_id = $4, \
                converted_talent_id = $2, \
                converted_account_id = $3, \
                converted_at = NOW() \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(id)
            .bind(talent_id)
            .bind(account_id)
            .bind(RosterStatus::Converted.id())
            .bind(RosterStatus::Active.id())
            .fetch_optional(&mut **tx)
            .await
    }

    // -----------------------------------------------------------------------
    // Replay bookkeeping
    // -----------------------------------------------------------------------

    /// Record that every production association of the entry has been
    /// replayed for the talent it converted to.
    pub async fn mark_replayed(
        pool: &PgPool,
        id: DbId,
        talent_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE roster_entries SET memberships_replayed_at = NOW() \
             WHERE id = $1 AND converted_talent_id = $2 AND memberships_replayed_at IS NULL",
        )
        .bind(id)
        .bind(talent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Entries converted to the talent whose membership replay never completed.
    pub async fn list_pending_replay(
        pool: &PgPool,
        talent_id: DbId,
    ) -> Result<Vec<RosterEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM roster_entries \
             WHERE converted_talent_id = $1 AND memberships_replayed_at IS NULL \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(talent_id)
            .fetch_all(pool)
            .await
    }

    /// Every entry converted to the talent, newest conversion first.
    pub async fn list_converted_for_talent(
        pool: &PgPool,
        talent_id: DbId,
    ) -> Result<Vec<RosterEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM roster_entries \
             WHERE converted_talent_id = $1 \
             ORDER BY converted_at DESC, id DESC"
        );
        sqlx::query_as::<_, RosterEntry>(&query)
            .bind(talent_id)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Production association helpers
    // -----------------------------------------------------------------------

    /// Associate an entry with a production. Fails with a unique violation
    /// (`uq_roster_entry_productions_entry_production`) on duplicates.
    pub async fn add_production(
        pool: &PgPool,
        roster_entry_id: DbId,
        input: &CreateRosterEntryProduction,
    ) -> Result<RosterEntryProduction, sqlx::Error> {
        let query = format!(
            "INSERT INTO roster_entry_productions (roster_entry_id, production_id, role, notes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PRODUCTION_LINK_COLUMNS}"
        );
        sqlx::query_as::<_, RosterEntryProduction>(&query)
            .bind(roster_entry_id)
            .bind(input.production_id)
            .bind(&input.role)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// All production associations of an entry, in creation order.
    pub async fn list_productions(
        pool: &PgPool,
        roster_entry_id: DbId,
    ) -> Result<Vec<RosterEntryProduction>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCTION_LINK_COLUMNS} FROM roster_entry_productions \
             WHERE roster_entry_id = $1 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, RosterEntryProduction>(&query)
            .bind(roster_entry_id)
            .fetch_all(pool)
            .await
    }
}
