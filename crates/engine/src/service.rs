//! The request-scoped report workflow service.
//!
//! Every operation follows the same shape: load the report with its
//! version, take a fresh directory snapshot, resolve the caller, apply the
//! transition to a private copy, write it back with a version check, and
//! only then hand notifications and rollup events to the collaborators.

use std::sync::Arc;

use anet_core::approval_step::StageRef;
use anet_core::directory::DirectorySnapshot;
use anet_core::error::CoreError;
use anet_core::notification::{NoopNotifier, NotificationTrigger, RollupSink};
use anet_core::report::{ApproveReport, CreateReport, RejectReport, Report, UpdateReport};
use anet_core::roles::Actor;
use anet_core::state_machine::{self, Transition, TransitionContext, WorkflowRules};
use anet_core::store::{DirectorySource, ReportStore, Versioned};
use anet_core::types::{DbId, Version};
use anet_core::workflow::{self, WorkflowEntry};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::WorkflowConfig;

/// A report as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub report: Report,
    pub version: Version,
    /// The stage currently awaiting approval.
    pub approval_step: Option<StageRef>,
    /// Current cycle with pending stages and live approvers.
    pub workflow: Vec<WorkflowEntry>,
}

impl ReportView {
    fn build(directory: &DirectorySnapshot, row: Versioned<Report>) -> Self {
        let workflow = workflow::render(directory, &row.value);
        Self {
            approval_step: row.value.approval_step().copied(),
            report: row.value,
            version: row.version,
            workflow,
        }
    }
}

pub struct ReportEngine<S, D> {
    store: S,
    directory: D,
    notifier: Arc<dyn NotificationTrigger>,
    rollup: Arc<dyn RollupSink>,
    clock: Arc<dyn Clock>,
    rules: WorkflowRules,
}

impl<S, D> ReportEngine<S, D>
where
    S: ReportStore,
    D: DirectorySource,
{
    /// An engine that discards notifications and uses the system clock.
    pub fn new(store: S, directory: D, config: &WorkflowConfig) -> Self {
        Self {
            store,
            directory,
            notifier: Arc::new(NoopNotifier),
            rollup: Arc::new(NoopNotifier),
            clock: Arc::new(SystemClock),
            rules: config.rules(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationTrigger>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_rollup_sink(mut self, rollup: Arc<dyn RollupSink>) -> Self {
        self.rollup = rollup;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn get_report(&self, report_id: DbId) -> Result<ReportView, CoreError> {
        let row = self.load(report_id).await?;
        let directory = self.directory.snapshot().await?;
        Ok(ReportView::build(&directory, row))
    }

    /// The rendered workflow, evaluated against current configuration.
    pub async fn workflow(&self, report_id: DbId) -> Result<Vec<WorkflowEntry>, CoreError> {
        Ok(self.get_report(report_id).await?.workflow)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn create_report(
        &self,
        person_id: DbId,
        input: CreateReport,
    ) -> Result<ReportView, CoreError> {
        let directory = self.directory.snapshot().await?;
        let ctx = TransitionContext {
            directory: &directory,
            actor: Actor::resolve(&directory, person_id),
            now: self.clock.now(),
        };
        let report = state_machine::create(input, &ctx)
            .inspect_err(|e| log_failure("create", None, person_id, e))?;
        let row = self.store.insert(report).await?;

        tracing::info!(
            report_id = row.value.id,
            person_id,
            authors = ?row.value.authors,
            "Report created"
        );
        Ok(ReportView::build(&directory, row))
    }

    pub async fn update_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        input: UpdateReport,
        expected_version: Option<Version>,
    ) -> Result<ReportView, CoreError> {
        let rules = self.rules;
        self.transition("update", person_id, report_id, expected_version, |report, ctx| {
            state_machine::edit(report, &input, ctx, &rules)
        })
        .await
    }

    pub async fn submit_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        expected_version: Option<Version>,
    ) -> Result<ReportView, CoreError> {
        let rules = self.rules;
        self.transition("submit", person_id, report_id, expected_version, |report, ctx| {
            state_machine::submit(report, ctx, &rules)
        })
        .await
    }

    pub async fn approve_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        input: ApproveReport,
    ) -> Result<ReportView, CoreError> {
        self.transition("approve", person_id, report_id, input.version, |report, ctx| {
            state_machine::approve(report, &input, ctx)
        })
        .await
    }

    pub async fn reject_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        input: RejectReport,
    ) -> Result<ReportView, CoreError> {
        self.transition("reject", person_id, report_id, input.version, |report, ctx| {
            state_machine::reject(report, &input, ctx)
        })
        .await
    }

    pub async fn publish_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        expected_version: Option<Version>,
    ) -> Result<ReportView, CoreError> {
        self.transition("publish", person_id, report_id, expected_version, |report, ctx| {
            state_machine::publish(report, ctx)
        })
        .await
    }

    pub async fn unpublish_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        expected_version: Option<Version>,
    ) -> Result<ReportView, CoreError> {
        self.transition("unpublish", person_id, report_id, expected_version, |report, ctx| {
            state_machine::unpublish(report, ctx)
        })
        .await
    }

    pub async fn delete_report(
        &self,
        person_id: DbId,
        report_id: DbId,
        expected_version: Option<Version>,
    ) -> Result<(), CoreError> {
        let row = self.load(report_id).await?;
        check_version(report_id, expected_version, row.version)
            .inspect_err(|e| log_failure("delete", Some(report_id), person_id, e))?;
        let directory = self.directory.snapshot().await?;
        let actor = Actor::resolve(&directory, person_id);

        state_machine::check_delete(&row.value, &actor)
            .inspect_err(|e| log_failure("delete", Some(report_id), person_id, e))?;
        self.store
            .delete(report_id, row.version)
            .await
            .inspect_err(|e| log_failure("delete", Some(report_id), person_id, e))?;

        tracing::info!(report_id, person_id, "Report deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn load(&self, report_id: DbId) -> Result<Versioned<Report>, CoreError> {
        self.store
            .find(report_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Report",
                id: report_id,
            })
    }

    async fn transition<F>(
        &self,
        operation: &'static str,
        person_id: DbId,
        report_id: DbId,
        expected_version: Option<Version>,
        apply: F,
    ) -> Result<ReportView, CoreError>
    where
        F: FnOnce(&mut Report, &TransitionContext<'_>) -> Result<Transition, CoreError>,
    {
        let row = self.load(report_id).await?;
        check_version(report_id, expected_version, row.version)
            .inspect_err(|e| log_failure(operation, Some(report_id), person_id, e))?;

        let directory = self.directory.snapshot().await?;
        let ctx = TransitionContext {
            directory: &directory,
            actor: Actor::resolve(&directory, person_id),
            now: self.clock.now(),
        };

        let mut report = row.value;
        let from = report.state;
        let transition = apply(&mut report, &ctx)
            .inspect_err(|e| log_failure(operation, Some(report_id), person_id, e))?;

        let version = self
            .store
            .update(&report, row.version)
            .await
            .inspect_err(|e| log_failure(operation, Some(report_id), person_id, e))?;

        tracing::info!(
            report_id,
            person_id,
            operation,
            from = %from,
            to = %report.state,
            stage = ?report.current_stage,
            version,
            "Report transition applied"
        );

        self.dispatch(&transition);
        Ok(ReportView::build(
            &directory,
            Versioned {
                value: report,
                version,
            },
        ))
    }

    fn dispatch(&self, transition: &Transition) {
        for notification in &transition.notifications {
            tracing::debug!(
                report_id = notification.report_id(),
                notification = ?notification,
                "Dispatching notification"
            );
            self.notifier.notify(notification);
        }
        if let Some(event) = &transition.rollup {
            self.rollup.record(event);
        }
    }
}

fn check_version(
    report_id: DbId,
    expected: Option<Version>,
    actual: Version,
) -> Result<(), CoreError> {
    match expected {
        Some(expected) if expected != actual => Err(CoreError::Conflict(format!(
            "Report {report_id} is at version {actual}, not {expected}; reload and retry"
        ))),
        _ => Ok(()),
    }
}

fn log_failure(operation: &str, report_id: Option<DbId>, person_id: DbId, error: &CoreError) {
    match error {
        CoreError::Internal(_) => tracing::error!(
            operation,
            report_id = ?report_id,
            person_id,
            error = %error,
            "Report operation failed"
        ),
        CoreError::Configuration(_) => tracing::warn!(
            operation,
            report_id = ?report_id,
            person_id,
            error = %error,
            "Approval configuration is unusable"
        ),
        CoreError::Forbidden(_) => tracing::info!(
            operation,
            report_id = ?report_id,
            person_id,
            error = %error,
            "Report operation refused"
        ),
        CoreError::NotFound { .. } | CoreError::Validation(_) | CoreError::Conflict(_) => {
            tracing::debug!(
                operation,
                report_id = ?report_id,
                person_id,
                error = %error,
                "Report operation rejected"
            )
        }
    }
}
