//! PostgreSQL implementations of the engine's storage seams.

use std::collections::HashMap;

use anet_core::directory::DirectorySnapshot;
use anet_core::error::CoreError;
use anet_core::report::Report;
use anet_core::store::{DirectorySource, ReportStore, Versioned};
use anet_core::types::{DbId, Version};
use async_trait::async_trait;

use crate::error::into_core;
use crate::models::report::ReportChildren;
use crate::repositories::{
    AdminSettingRepo, ApprovalStepRepo, LocationRepo, OrganizationRepo, PositionRepo, ReportRepo,
    TaskRepo,
};
use crate::DbPool;

/// Open a transaction that sees one consistent snapshot and cannot write.
async fn begin_read_snapshot(
    pool: &DbPool,
) -> Result<sqlx::Transaction<'static, sqlx::Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Report storage with version-checked writes.
///
/// The report row carries the version; an update bumps it only when it
/// still matches the caller's, and every child table is rewritten in the
/// same transaction.
#[derive(Clone)]
pub struct PgReportStore {
    pool: DbPool,
}

impl PgReportStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn missing_or_stale(&self, id: DbId, expected_version: Version) -> CoreError {
        match ReportRepo::exists(&self.pool, id).await {
            Ok(true) => CoreError::Conflict(format!(
                "Report {id} is no longer at version {expected_version}; reload and retry"
            )),
            Ok(false) => CoreError::NotFound {
                entity: "Report",
                id,
            },
            Err(e) => into_core(e),
        }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, report: Report) -> Result<Versioned<Report>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        let row = ReportRepo::insert(&mut tx, &report).await.map_err(into_core)?;
        ReportRepo::replace_authors(&mut tx, row.id, &report.authors)
            .await
            .map_err(into_core)?;
        ReportRepo::replace_tasks(&mut tx, row.id, &report.task_ids)
            .await
            .map_err(into_core)?;
        ReportRepo::replace_stages(&mut tx, row.id, &report.stages)
            .await
            .map_err(into_core)?;
        ReportRepo::append_actions(&mut tx, row.id, 0, &report.workflow)
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;

        Ok(Versioned {
            value: Report {
                id: row.id,
                ..report
            },
            version: row.version,
        })
    }

    async fn find(&self, id: DbId) -> Result<Option<Versioned<Report>>, CoreError> {
        let mut tx = begin_read_snapshot(&self.pool).await.map_err(into_core)?;

        let Some(row) = ReportRepo::find_by_id(&mut *tx, id).await.map_err(into_core)? else {
            return Ok(None);
        };
        let children = ReportChildren {
            authors: ReportRepo::list_authors(&mut *tx, id).await.map_err(into_core)?,
            task_ids: ReportRepo::list_tasks(&mut *tx, id).await.map_err(into_core)?,
            stages: ReportRepo::list_stages(&mut *tx, id).await.map_err(into_core)?,
            actions: ReportRepo::list_actions(&mut *tx, id).await.map_err(into_core)?,
        };

        tx.commit().await.map_err(into_core)?;
        row.into_domain(children).map(Some)
    }

    async fn update(&self, report: &Report, expected_version: Version) -> Result<Version, CoreError> {
        let mut tx = self.pool.begin().await.map_err(into_core)?;

        let Some(version) = ReportRepo::update_checked(&mut tx, report, expected_version)
            .await
            .map_err(into_core)?
        else {
            drop(tx);
            return Err(self.missing_or_stale(report.id, expected_version).await);
        };

        ReportRepo::replace_authors(&mut tx, report.id, &report.authors)
            .await
            .map_err(into_core)?;
        ReportRepo::replace_tasks(&mut tx, report.id, &report.task_ids)
            .await
            .map_err(into_core)?;
        ReportRepo::replace_stages(&mut tx, report.id, &report.stages)
            .await
            .map_err(into_core)?;

        // The log is append-only: write only the entries not yet stored.
        let stored = ReportRepo::count_actions(&mut *tx, report.id)
            .await
            .map_err(into_core)?;
        let stored = usize::try_from(stored)
            .ok()
            .filter(|n| *n <= report.workflow.len())
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "Report {} has {stored} stored actions but {} in memory",
                    report.id,
                    report.workflow.len()
                ))
            })?;
        ReportRepo::append_actions(&mut tx, report.id, stored, &report.workflow[stored..])
            .await
            .map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;
        Ok(version)
    }

    async fn delete(&self, id: DbId, expected_version: Version) -> Result<(), CoreError> {
        let deleted = ReportRepo::delete_checked(&self.pool, id, expected_version)
            .await
            .map_err(into_core)?;
        if deleted {
            Ok(())
        } else {
            Err(self.missing_or_stale(id, expected_version).await)
        }
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Loads the approval configuration from the database.
///
/// Every table is read inside one repeatable-read transaction, so a
/// snapshot never mixes configuration from before and after a concurrent
/// administrative change.
#[derive(Clone)]
pub struct PgDirectorySource {
    pool: DbPool,
}

impl PgDirectorySource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load(&self) -> Result<DirectorySnapshot, CoreError> {
        let mut tx = begin_read_snapshot(&self.pool).await.map_err(into_core)?;

        let organizations = OrganizationRepo::list_all(&mut *tx).await.map_err(into_core)?;
        let positions = PositionRepo::list_all(&mut *tx).await.map_err(into_core)?;
        let tasks = TaskRepo::list_all(&mut *tx).await.map_err(into_core)?;
        let tasked = TaskRepo::list_tasked_organizations(&mut *tx)
            .await
            .map_err(into_core)?;
        let locations = LocationRepo::list_all(&mut *tx).await.map_err(into_core)?;
        let steps = ApprovalStepRepo::list_all(&mut *tx).await.map_err(into_core)?;
        let approvers = ApprovalStepRepo::list_approvers(&mut *tx)
            .await
            .map_err(into_core)?;
        let settings = AdminSettingRepo::list_all(&mut *tx).await.map_err(into_core)?;

        tx.commit().await.map_err(into_core)?;

        let mut tasked_by_task: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for link in tasked {
            tasked_by_task
                .entry(link.task_id)
                .or_default()
                .push(link.organization_id);
        }
        let mut approvers_by_step: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for link in approvers {
            approvers_by_step
                .entry(link.approval_step_id)
                .or_default()
                .push(link.position_id);
        }

        let mut dir = DirectorySnapshot::new();
        for row in organizations {
            dir.insert_organization(row.into_domain());
        }
        for row in positions {
            dir.insert_position(row.into_domain()?);
        }
        for row in tasks {
            let tasked_ids = tasked_by_task.remove(&row.id).unwrap_or_default();
            dir.insert_task(row.into_domain(tasked_ids));
        }
        for row in locations {
            dir.insert_location(row.into_domain());
        }
        let step_count = steps.len();
        for row in steps {
            let approver_ids = approvers_by_step.remove(&row.id).unwrap_or_default();
            dir.insert_step(row.into_domain(approver_ids)?);
        }
        for row in settings {
            if let Some(value) = row.value {
                dir.set_setting(row.key, value);
            }
        }

        tracing::debug!(steps = step_count, "Directory snapshot loaded");
        Ok(dir)
    }
}

#[async_trait]
impl DirectorySource for PgDirectorySource {
    async fn snapshot(&self) -> Result<DirectorySnapshot, CoreError> {
        self.load().await
    }
}
