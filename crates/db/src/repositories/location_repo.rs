//! Repository for the `locations` table.

use anet_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::location::{CreateLocation, LocationRow};

const COLUMNS: &str = "id, name, created_at, updated_at";

pub struct LocationRepo;

impl LocationRepo {
    pub async fn create(pool: &PgPool, input: &CreateLocation) -> Result<LocationRow, sqlx::Error> {
        let query = format!("INSERT INTO locations (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, LocationRow>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<LocationRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM locations WHERE id = $1");
        sqlx::query_as::<_, LocationRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<LocationRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM locations ORDER BY id");
        sqlx::query_as::<_, LocationRow>(&query)
            .fetch_all(executor)
            .await
    }
}
