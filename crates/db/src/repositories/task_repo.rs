//! Repository for the `tasks` and `task_tasked_organizations` tables.

use anet_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::task::{CreateTask, TaskRow, TaskedOrganizationRow};

/// Column list for tasks queries.
const COLUMNS: &str = "id, short_name, created_at, updated_at";

pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task together with its tasked organizations.
    pub async fn create(pool: &PgPool, input: &CreateTask) -> Result<TaskRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("INSERT INTO tasks (short_name) VALUES ($1) RETURNING {COLUMNS}");
        let task = sqlx::query_as::<_, TaskRow>(&query)
            .bind(&input.short_name)
            .fetch_one(&mut *tx)
            .await?;

        for &organization_id in &input.tasked_organization_ids {
            sqlx::query(
                "INSERT INTO task_tasked_organizations (task_id, organization_id)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(task.id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<TaskRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<TaskRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM tasks ORDER BY id");
        sqlx::query_as::<_, TaskRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// All task to tasked-organization links, grouped by task.
    pub async fn list_tasked_organizations<'e, E>(
        executor: E,
    ) -> Result<Vec<TaskedOrganizationRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TaskedOrganizationRow>(
            "SELECT task_id, organization_id FROM task_tasked_organizations
             ORDER BY task_id, created_at, organization_id",
        )
        .fetch_all(executor)
        .await
    }

    /// Delete a task. Returns `true` if a row was removed.
    ///
    /// Reports keep their reference to the task; its steps become ownerless.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
