//! Repository for the `studios` and `productions` tables.

use sqlx::PgPool;
use casting_core::types::DbId;

use crate::models::studio::{CreateProduction, CreateStudio, Production, Studio};

/// Column list for the `studios` table.
const STUDIO_COLUMNS: &str = "id, name, created_at, updated_at";

/// Column list for the `productions` table.
const PRODUCTION_COLUMNS: &str = "id, studio_id, title, created_at, updated_at";

pub struct StudioRepo;

impl StudioRepo {
    pub async fn create(pool: &PgPool, input: &CreateStudio) -> Result<Studio, sqlx::Error> {
        let query = format!("INSERT INTO studios (name) VALUES ($1) RETURNING {STUDIO_COLUMNS}");
        sqlx::query_as::<_, Studio>(&query)
            .bind(input.name.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Studio>, sqlx::Error> {
        let query = format!("SELECT {STUDIO_COLUMNS} FROM studios WHERE id = $1");
        sqlx::query_as::<_, Studio>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

pub struct ProductionRepo;

impl ProductionRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProduction,
    ) -> Result<Production, sqlx::Error> {
        let query = format!(
            "INSERT INTO productions (studio_id, title) VALUES ($1, $2) \
             RETURNING {PRODUCTION_COLUMNS}"
        );
        sqlx::query_as::<_, Production>(&query)
            .bind(input.studio_id)
            .bind(input.title.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Production>, sqlx::Error> {
        let query = format!("SELECT {PRODUCTION_COLUMNS} FROM productions WHERE id = $1");
        sqlx::query_as::<_, Production>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
