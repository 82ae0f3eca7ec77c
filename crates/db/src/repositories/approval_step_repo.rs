//! Repository for the `approval_steps` and `approvers` tables.

use anet_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::approval_step::{ApprovalStepRow, ApproverRow, CreateApprovalStep};

/// Column list for approval_steps queries.
const COLUMNS: &str = "id, owner_type, owner_id, name, step_type, restricted_approval, \
    next_step_id, created_at, updated_at";

pub struct ApprovalStepRepo;

impl ApprovalStepRepo {
    /// Insert a step and its approver positions.
    pub async fn create(
        pool: &PgPool,
        input: &CreateApprovalStep,
    ) -> Result<ApprovalStepRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO approval_steps
                (owner_type, owner_id, name, step_type, restricted_approval, next_step_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let step = sqlx::query_as::<_, ApprovalStepRow>(&query)
            .bind(input.owner.kind())
            .bind(input.owner.id())
            .bind(&input.name)
            .bind(input.step_type.as_str())
            .bind(input.restricted_approval)
            .bind(input.next_step_id)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_approvers_inner(&mut tx, step.id, &input.approver_position_ids).await?;

        tx.commit().await?;
        Ok(step)
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<ApprovalStepRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM approval_steps WHERE id = $1");
        sqlx::query_as::<_, ApprovalStepRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List all steps ordered by id.
    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<ApprovalStepRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM approval_steps ORDER BY id");
        sqlx::query_as::<_, ApprovalStepRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// All step to approver-position links, grouped by step in insertion order.
    pub async fn list_approvers<'e, E>(executor: E) -> Result<Vec<ApproverRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ApproverRow>(
            "SELECT approval_step_id, position_id FROM approvers
             ORDER BY approval_step_id, created_at, position_id",
        )
        .fetch_all(executor)
        .await
    }

    /// Re-link a step within its chain.
    pub async fn set_next(
        pool: &PgPool,
        id: DbId,
        next_step_id: Option<DbId>,
    ) -> Result<Option<ApprovalStepRow>, sqlx::Error> {
        let query = format!(
            "UPDATE approval_steps SET next_step_id = $2
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ApprovalStepRow>(&query)
            .bind(id)
            .bind(next_step_id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the approver positions of a step.
    ///
    /// Reports waiting at the step pick the change up on their next
    /// evaluation; their stage sequence is not touched.
    pub async fn set_approvers(
        pool: &PgPool,
        id: DbId,
        position_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::set_approvers_inner(&mut tx, id, position_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Delete a step. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM approval_steps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_approvers_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        approval_step_id: DbId,
        position_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM approvers WHERE approval_step_id = $1")
            .bind(approval_step_id)
            .execute(&mut **tx)
            .await?;

        for &position_id in position_ids {
            sqlx::query(
                "INSERT INTO approvers (approval_step_id, position_id)
                 VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(approval_step_id)
            .bind(position_id)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
