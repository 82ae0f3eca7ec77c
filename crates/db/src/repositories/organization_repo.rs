//! Repository for the `organizations` table.

use anet_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::organization::{CreateOrganization, OrganizationRow};

/// Column list for organizations queries.
const COLUMNS: &str = "id, short_name, parent_organization_id, created_at, updated_at";

pub struct OrganizationRepo;

impl OrganizationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateOrganization,
    ) -> Result<OrganizationRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO organizations (short_name, parent_organization_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(&input.short_name)
            .bind(input.parent_organization_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<OrganizationRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM organizations WHERE id = $1");
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all organizations ordered by id.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<OrganizationRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM organizations ORDER BY id");
        sqlx::query_as::<_, OrganizationRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// Move an organization under a new parent, or to the top level.
    pub async fn set_parent(
        pool: &PgPool,
        id: DbId,
        parent_organization_id: Option<DbId>,
    ) -> Result<Option<OrganizationRow>, sqlx::Error> {
        let query = format!(
            "UPDATE organizations SET parent_organization_id = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrganizationRow>(&query)
            .bind(id)
            .bind(parent_organization_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an organization. Returns `true` if a row was removed.
    ///
    /// Approval steps owned by the organization are left in place; the engine
    /// ignores steps whose owner no longer exists.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
