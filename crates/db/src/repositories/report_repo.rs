//! Repository for `reports` and its child tables: `report_authors`,
//! `report_tasks`, `report_stages` and `report_actions`.

use anet_core::approval_step::StageRef;
use anet_core::report::{Report, WorkflowAction};
use anet_core::types::{DbId, Version};
use sqlx::PgExecutor;

use crate::models::report::{ReportActionRow, ReportRow, ReportStageRow};

type Tx<'a> = sqlx::Transaction<'a, sqlx::Postgres>;

/// Column list for reports queries.
const COLUMNS: &str = "id, state, intent, report_text, engagement_date, cancelled_reason, \
    primary_advisor_id, advisor_organization_id, location_id, current_stage, released_at, \
    version, created_at, updated_at";

const STAGE_COLUMNS: &str = "report_id, sequence, approval_step_id, owner_type, owner_id";

const ACTION_COLUMNS: &str = "id, report_id, sequence, action_type, acting_person_id, \
    approval_step_id, owner_type, owner_id, comment, created_at";

pub struct ReportRepo;

impl ReportRepo {
    // -----------------------------------------------------------------------
    // reports
    // -----------------------------------------------------------------------

    /// Insert the report row at version 1. Child rows are written separately.
    pub async fn insert(tx: &mut Tx<'_>, report: &Report) -> Result<ReportRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO reports
                (state, intent, report_text, engagement_date, cancelled_reason,
                 primary_advisor_id, advisor_organization_id, location_id, current_stage,
                 released_at, version, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(report.state.as_str())
            .bind(&report.intent)
            .bind(&report.report_text)
            .bind(report.engagement_date)
            .bind(&report.cancelled_reason)
            .bind(report.primary_advisor_id)
            .bind(report.advisor_organization_id)
            .bind(report.location_id)
            .bind(report.current_stage.map(db_int).transpose()?)
            .bind(report.released_at)
            .bind(report.created_at)
            .bind(report.updated_at)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<ReportRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE id = $1");
        sqlx::query_as::<_, ReportRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn exists<'e, E>(executor: E, id: DbId) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reports WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Overwrite the report row if it is still at `expected_version`.
    ///
    /// Returns the new version, or `None` when the row is missing or has
    /// moved on. The row lock taken here serializes concurrent writers.
    pub async fn update_checked(
        tx: &mut Tx<'_>,
        report: &Report,
        expected_version: Version,
    ) -> Result<Option<Version>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE reports SET
                state = $3,
                intent = $4,
                report_text = $5,
                engagement_date = $6,
                cancelled_reason = $7,
                primary_advisor_id = $8,
                advisor_organization_id = $9,
                location_id = $10,
                current_stage = $11,
                released_at = $12,
                updated_at = $13,
                version = version + 1
             WHERE id = $1 AND version = $2
             RETURNING version",
        )
        .bind(report.id)
        .bind(expected_version)
        .bind(report.state.as_str())
        .bind(&report.intent)
        .bind(&report.report_text)
        .bind(report.engagement_date)
        .bind(&report.cancelled_reason)
        .bind(report.primary_advisor_id)
        .bind(report.advisor_organization_id)
        .bind(report.location_id)
        .bind(report.current_stage.map(db_int).transpose()?)
        .bind(report.released_at)
        .bind(report.updated_at)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Delete the report if it is still at `expected_version`. Child rows
    /// cascade. Returns `true` if a row was removed.
    pub async fn delete_checked<'e, E>(
        executor: E,
        id: DbId,
        expected_version: Version,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // authors and tasks
    // -----------------------------------------------------------------------

    pub async fn list_authors<'e, E>(executor: E, report_id: DbId) -> Result<Vec<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT person_id FROM report_authors WHERE report_id = $1 ORDER BY sort_order",
        )
        .bind(report_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_tasks<'e, E>(executor: E, report_id: DbId) -> Result<Vec<DbId>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT task_id FROM report_tasks WHERE report_id = $1 ORDER BY sort_order",
        )
        .bind(report_id)
        .fetch_all(executor)
        .await
    }

    pub async fn replace_authors(
        tx: &mut Tx<'_>,
        report_id: DbId,
        person_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM report_authors WHERE report_id = $1")
            .bind(report_id)
            .execute(&mut **tx)
            .await?;

        for (idx, &person_id) in person_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO report_authors (report_id, person_id, sort_order) VALUES ($1, $2, $3)",
            )
            .bind(report_id)
            .bind(person_id)
            .bind(db_int(idx)?)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn replace_tasks(
        tx: &mut Tx<'_>,
        report_id: DbId,
        task_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM report_tasks WHERE report_id = $1")
            .bind(report_id)
            .execute(&mut **tx)
            .await?;

        for (idx, &task_id) in task_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO report_tasks (report_id, task_id, sort_order) VALUES ($1, $2, $3)",
            )
            .bind(report_id)
            .bind(task_id)
            .bind(db_int(idx)?)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // stages
    // -----------------------------------------------------------------------

    pub async fn list_stages<'e, E>(
        executor: E,
        report_id: DbId,
    ) -> Result<Vec<ReportStageRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {STAGE_COLUMNS} FROM report_stages WHERE report_id = $1 ORDER BY sequence"
        );
        sqlx::query_as::<_, ReportStageRow>(&query)
            .bind(report_id)
            .fetch_all(executor)
            .await
    }

    /// Replace the frozen stage sequence. Only identities are stored.
    pub async fn replace_stages(
        tx: &mut Tx<'_>,
        report_id: DbId,
        stages: &[StageRef],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM report_stages WHERE report_id = $1")
            .bind(report_id)
            .execute(&mut **tx)
            .await?;

        for (idx, stage) in stages.iter().enumerate() {
            sqlx::query(
                "INSERT INTO report_stages
                    (report_id, sequence, approval_step_id, owner_type, owner_id)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(report_id)
            .bind(db_int(idx)?)
            .bind(stage.step_id)
            .bind(stage.owner.kind())
            .bind(stage.owner.id())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // actions
    // -----------------------------------------------------------------------

    pub async fn list_actions<'e, E>(
        executor: E,
        report_id: DbId,
    ) -> Result<Vec<ReportActionRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {ACTION_COLUMNS} FROM report_actions WHERE report_id = $1 ORDER BY sequence"
        );
        sqlx::query_as::<_, ReportActionRow>(&query)
            .bind(report_id)
            .fetch_all(executor)
            .await
    }

    pub async fn count_actions<'e, E>(executor: E, report_id: DbId) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM report_actions WHERE report_id = $1")
            .bind(report_id)
            .fetch_one(executor)
            .await
    }

    /// Append actions to the log, numbering them from `first_sequence`.
    pub async fn append_actions(
        tx: &mut Tx<'_>,
        report_id: DbId,
        first_sequence: usize,
        actions: &[WorkflowAction],
    ) -> Result<(), sqlx::Error> {
        for (offset, action) in actions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO report_actions
                    (report_id, sequence, action_type, acting_person_id,
                     approval_step_id, owner_type, owner_id, comment, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(report_id)
            .bind(db_int(first_sequence + offset)?)
            .bind(action.action_type.as_str())
            .bind(action.acting_person_id)
            .bind(action.step.map(|s| s.step_id))
            .bind(action.step.map(|s| s.owner.kind()))
            .bind(action.step.map(|s| s.owner.id()))
            .bind(&action.comment)
            .bind(action.created_at)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

/// Convert an in-memory index into its `INTEGER` column value.
fn db_int(value: usize) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}
