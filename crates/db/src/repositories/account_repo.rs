//! Repository for the `accounts` and `talent_records` tables.
//!
//! Accounts are written by the registration flow of the surrounding
//! application; `create` exists for that flow and for tests.

use sqlx::PgPool;
use casting_core::matching::{normalize_email, normalize_optional_phone};
use casting_core::types::DbId;

use crate::models::account::{Account, CreateAccount, CreateTalentRecord, TalentRecord};

/// Column list for the `accounts` table.
const ACCOUNT_COLUMNS: &str = "id, email, phone, role, created_at, updated_at";

/// Column list for the `talent_records` table.
const TALENT_COLUMNS: &str = "id, account_id, display_name, created_at, updated_at";

pub struct AccountRepo;

impl AccountRepo {
    /// Insert an account. Email is stored trimmed and lowercased, phone normalized.
    pub async fn create(pool: &PgPool, input: &CreateAccount) -> Result<Account, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (email, phone, role) VALUES ($1, $2, $3) \
             RETURNING {ACCOUNT_COLUMNS}"
        );
        let email = normalize_email(&input.email).unwrap_or_default();
        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .bind(normalize_optional_phone(input.phone.as_deref()))
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Account>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }
}

pub struct TalentRecordRepo;

impl TalentRecordRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateTalentRecord,
    ) -> Result<TalentRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO talent_records (account_id, display_name) VALUES ($1, $2) \
             RETURNING {TALENT_COLUMNS}"
        );
        sqlx::query_as::<_, TalentRecord>(&query)
            .bind(input.account_id)
            .bind(&input.display_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TalentRecord>, sqlx::Error> {
        let query = format!("SELECT {TALENT_COLUMNS} FROM talent_records WHERE id = $1");
        sqlx::query_as::<_, TalentRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_account_id(
        pool: &PgPool,
        account_id: DbId,
    ) -> Result<Option<TalentRecord>, sqlx::Error> {
        let query = format!("SELECT {TALENT_COLUMNS} FROM talent_records WHERE account_id = $1");
        sqlx::query_as::<_, TalentRecord>(&query)
            .bind(account_id)
            .fetch_optional(pool)
            .await
    }
}
