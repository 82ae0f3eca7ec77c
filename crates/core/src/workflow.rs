//! Composition of a report's stage sequence and rendering of its workflow.
//!
//! A sequence is assembled from three independent sources, in this order:
//!
//! 1. the organizational chain of the advisor organization (skipped for
//!    planned engagements),
//! 2. the applicable steps of every linked task, in task order,
//! 3. the chain of the report's location.
//!
//! Only stage identities are produced. Names and approvers are looked up
//! again whenever a stage is displayed or acted upon.

use serde::Serialize;

use crate::approval_step::{ApprovalStepType, StageRef, StepOwner};
use crate::authorizer::live_approvers;
use crate::directory::DirectorySnapshot;
use crate::error::CoreError;
use crate::org_chain;
use crate::report::{ActionType, Report, ReportState};
use crate::task_filter;
use crate::types::{DbId, Timestamp};

/// Whether an engagement on `engagement_date` counts as planned at `now`.
pub fn is_planned(engagement_date: Option<Timestamp>, now: Timestamp) -> bool {
    engagement_date.is_some_and(|date| date > now)
}

/// Build the ordered stage sequence for a report.
///
/// Tasks or a location that no longer exist contribute no stages. The only
/// failure is an unusable default approval organization, which is reached
/// only when no organization in the advisor's ancestry has a chain.
pub fn compose(
    directory: &DirectorySnapshot,
    advisor_organization_id: Option<DbId>,
    task_ids: &[DbId],
    location_id: Option<DbId>,
    is_planned: bool,
) -> Result<Vec<StageRef>, CoreError> {
    let mut stages = Vec::new();

    if !is_planned {
        let chain = org_chain::resolve(directory, advisor_organization_id)?;
        stages.extend(chain.iter().map(|step| step.stage_ref()));
    }

    for task_id in task_ids {
        let Some(task) = directory.task(*task_id) else {
            continue;
        };
        let steps = task_filter::filter(directory, task, advisor_organization_id, is_planned);
        stages.extend(steps.iter().map(|step| step.stage_ref()));
    }

    if let Some(location_id) = location_id {
        let step_type = ApprovalStepType::for_engagement(is_planned);
        stages.extend(
            directory
                .chain_for(StepOwner::Location(location_id), step_type)
                .iter()
                .map(|step| step.stage_ref()),
        );
    }

    Ok(stages)
}

/// Compose the sequence for `report` as it currently stands.
pub fn compose_for_report(
    directory: &DirectorySnapshot,
    report: &Report,
    now: Timestamp,
) -> Result<Vec<StageRef>, CoreError> {
    compose(
        directory,
        report.advisor_organization_id,
        &report.task_ids,
        report.location_id,
        report.is_planned(now),
    )
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// One row of the rendered workflow.
///
/// Recorded actions carry their actor and time. Pending rows have neither
/// and stand for stages of the current cycle not acted upon yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowEntry {
    /// `None` for pending rows.
    pub action_type: Option<ActionType>,
    pub acting_person_id: Option<DbId>,
    pub created_at: Option<Timestamp>,
    pub step: Option<StageRef>,
    /// Current name of the step; `None` when the step is gone.
    pub step_name: Option<String>,
    /// Live approver positions of the step.
    pub approver_position_ids: Vec<DbId>,
    pub comment: Option<String>,
}

impl WorkflowEntry {
    pub fn is_pending(&self) -> bool {
        self.action_type.is_none()
    }
}

/// Render the workflow of `report` against current configuration.
///
/// Shows the actions of the current submission cycle followed, while the
/// report is pending approval, by one pending row per stage from the
/// current one to the end.
pub fn render(directory: &DirectorySnapshot, report: &Report) -> Vec<WorkflowEntry> {
    let stage_details = |stage: Option<StageRef>| match stage {
        Some(stage) => (
            directory.step(stage.step_id).map(|s| s.name.clone()),
            live_approvers(directory, report, &stage)
                .iter()
                .map(|p| p.id)
                .collect::<Vec<DbId>>(),
        ),
        None => (None, Vec::new()),
    };

    let mut entries: Vec<WorkflowEntry> = report
        .current_cycle()
        .iter()
        .map(|action| {
            let (step_name, approver_position_ids) = stage_details(action.step);
            WorkflowEntry {
                action_type: Some(action.action_type),
                acting_person_id: Some(action.acting_person_id),
                created_at: Some(action.created_at),
                step: action.step,
                step_name,
                approver_position_ids,
                comment: action.comment.clone(),
            }
        })
        .collect();

    if report.state == ReportState::PendingApproval {
        if let Some(current) = report.current_stage {
            for stage in report.stages.iter().skip(current) {
                let (step_name, approver_position_ids) = stage_details(Some(*stage));
                entries.push(WorkflowEntry {
                    action_type: None,
                    acting_person_id: None,
                    created_at: None,
                    step: Some(*stage),
                    step_name,
                    approver_position_ids,
                    comment: None,
                });
            }
        }
    }

    entries
}
