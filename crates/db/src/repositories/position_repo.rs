//! Repository for the `positions` table.

use anet_core::roles::POSITION_REGULAR;
use anet_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::position::{CreatePosition, PositionRow};

/// Column list for positions queries.
const COLUMNS: &str =
    "id, name, organization_id, person_id, position_type, created_at, updated_at";

pub struct PositionRepo;

impl PositionRepo {
    pub async fn create(pool: &PgPool, input: &CreatePosition) -> Result<PositionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO positions (name, organization_id, person_id, position_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PositionRow>(&query)
            .bind(&input.name)
            .bind(input.organization_id)
            .bind(input.person_id)
            .bind(input.position_type.as_deref().unwrap_or(POSITION_REGULAR))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<PositionRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM positions WHERE id = $1");
        sqlx::query_as::<_, PositionRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<PositionRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM positions ORDER BY id");
        sqlx::query_as::<_, PositionRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// Put a person into a position, or vacate it with `None`.
    ///
    /// A person holds at most one position, so any other position they hold
    /// is vacated in the same transaction.
    pub async fn assign_person(
        pool: &PgPool,
        id: DbId,
        person_id: Option<DbId>,
    ) -> Result<Option<PositionRow>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if let Some(person_id) = person_id {
            sqlx::query("UPDATE positions SET person_id = NULL WHERE person_id = $1 AND id <> $2")
                .bind(person_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let query = format!(
            "UPDATE positions SET person_id = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, PositionRow>(&query)
            .bind(id)
            .bind(person_id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row)
    }
}
