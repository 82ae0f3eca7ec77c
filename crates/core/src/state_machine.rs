//! Report lifecycle transitions.
//!
//! ```text
//! DRAFT ──submit──> PENDING_APPROVAL ──approve (last)──> APPROVED ──publish──> PUBLISHED
//!   ^  \                  │    \                              │                  │
//!   │   \                 │     └──approve (last, cancelled)──┼──> CANCELLED     │
//!   │    └─submit (no stages)──> APPROVED | CANCELLED         │                  │
//!   │                     │                                   │                  │
//!   │              reject │             admin reject          │                  │
//!   │                     v                                   │                  │
//!   │                 REJECTED <──────────────────────────────┘                  │
//!   │                     └──submit──> (sequence rebuilt)                        │
//!   └────────────────────────────────── unpublish (admin) ──────────────────────┘
//! ```
//!
//! Every function checks everything it needs before touching the report, so
//! an `Err` always leaves the report exactly as it was. Callers persist the
//! mutated report and then dispatch the returned [`Transition`].

use validator::Validate;

use crate::approval_step::StageRef;
use crate::authorizer::{can_act, live_approvers};
use crate::directory::DirectorySnapshot;
use crate::error::CoreError;
use crate::notification::{Notification, RollupEvent};
use crate::report::{
    unique_ids, ActionType, ApproveReport, CreateReport, RejectReport, Report, ReportState,
    UpdateReport, WorkflowAction,
};
use crate::roles::Actor;
use crate::types::Timestamp;
use crate::workflow::compose_for_report;

/// Everything a transition evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    pub directory: &'a DirectorySnapshot,
    pub actor: Actor,
    pub now: Timestamp,
}

/// Deployment rules that shape transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowRules {
    /// Submission requires an engagement date.
    pub require_engagement_date: bool,
    /// Authors are told when an approver edits their report back to draft.
    pub notify_on_edit: bool,
}

impl Default for WorkflowRules {
    fn default() -> Self {
        Self {
            require_engagement_date: true,
            notify_on_edit: true,
        }
    }
}

/// Side effects of a successful transition, to be dispatched after the
/// report has been stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    pub notifications: Vec<Notification>,
    pub rollup: Option<RollupEvent>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn notify(notification: Notification) -> Self {
        Self {
            notifications: vec![notification],
            rollup: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Create / edit / delete
// ---------------------------------------------------------------------------

/// A new draft authored by the actor unless other authors are given.
pub fn create(input: CreateReport, ctx: &TransitionContext<'_>) -> Result<Report, CoreError> {
    input.validate()?;
    let mut report = Report::new_draft(input, ctx.actor.person_id, ctx.now);
    report.advisor_organization_id = report
        .primary_advisor_id
        .and_then(|advisor| ctx.directory.organization_for_person(advisor));
    Ok(report)
}

/// Apply an edit.
///
/// | state            | who may edit                              | effect          |
/// |------------------|-------------------------------------------|-----------------|
/// | PUBLISHED        | nobody                                    |                 |
/// | PENDING_APPROVAL | authors                                   | state kept      |
/// | PENDING_APPROVAL | current-stage approvers, administrators   | back to DRAFT   |
/// | DRAFT, REJECTED  | authors                                   | state kept      |
/// | APPROVED, CANCELLED | authors                                | back to DRAFT   |
pub fn edit(
    report: &mut Report,
    input: &UpdateReport,
    ctx: &TransitionContext<'_>,
    rules: &WorkflowRules,
) -> Result<Transition, CoreError> {
    input.validate()?;
    if input.authors.as_ref().is_some_and(Vec::is_empty) {
        return Err(CoreError::Validation(
            "A report must keep at least one author".into(),
        ));
    }

    let actor = ctx.actor;
    let is_author = report.is_author(actor.person_id);
    let demote = match report.state {
        ReportState::Published => {
            return Err(CoreError::Forbidden(
                "Published reports cannot be edited".into(),
            ));
        }
        ReportState::PendingApproval if is_author => false,
        ReportState::PendingApproval => {
            let may_act = report
                .approval_step()
                .is_some_and(|stage| can_act(ctx.directory, report, stage, &actor));
            if !may_act {
                return Err(CoreError::Forbidden(
                    "Only authors or current approvers may edit a report under approval".into(),
                ));
            }
            true
        }
        ReportState::Draft | ReportState::Rejected | ReportState::Approved
        | ReportState::Cancelled
            if !is_author =>
        {
            return Err(CoreError::Forbidden(
                "Only authors may edit this report".into(),
            ));
        }
        ReportState::Draft | ReportState::Rejected => false,
        ReportState::Approved | ReportState::Cancelled => true,
    };

    let notify_authors = demote && !is_author && rules.notify_on_edit;

    if let Some(intent) = &input.intent {
        report.intent = intent.clone();
    }
    if let Some(text) = &input.report_text {
        report.report_text = text.clone();
    }
    if let Some(date) = input.engagement_date {
        report.engagement_date = date;
    }
    if let Some(reason) = &input.cancelled_reason {
        report.cancelled_reason = reason.clone();
    }
    if let Some(authors) = &input.authors {
        report.authors = unique_ids(authors.iter().copied());
    }
    if let Some(advisor) = input.primary_advisor_id {
        if report.primary_advisor_id != advisor {
            report.primary_advisor_id = advisor;
            report.advisor_organization_id =
                advisor.and_then(|person| ctx.directory.organization_for_person(person));
        }
    }
    if let Some(task_ids) = &input.task_ids {
        report.task_ids = unique_ids(task_ids.iter().copied());
    }
    if let Some(location_id) = input.location_id {
        report.location_id = location_id;
    }

    if demote {
        report.state = ReportState::Draft;
        report.current_stage = None;
    }
    report.updated_at = ctx.now;

    if notify_authors {
        Ok(Transition::notify(Notification::ReportEdited {
            report_id: report.id,
            editor: actor.person_id,
            recipients: report.authors.clone(),
        }))
    } else {
        Ok(Transition::none())
    }
}

/// Only authors may delete, and only reports that are not in approval or
/// beyond.
pub fn check_delete(report: &Report, actor: &Actor) -> Result<(), CoreError> {
    if !report.is_author(actor.person_id) {
        return Err(CoreError::Forbidden(
            "Only authors may delete a report".into(),
        ));
    }
    match report.state {
        ReportState::Draft | ReportState::Rejected => Ok(()),
        state => Err(CoreError::Forbidden(format!(
            "A report in state {state} cannot be deleted"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Approval workflow
// ---------------------------------------------------------------------------

/// Submit a draft or rejected report, rebuilding its stage sequence.
pub fn submit(
    report: &mut Report,
    ctx: &TransitionContext<'_>,
    rules: &WorkflowRules,
) -> Result<Transition, CoreError> {
    let actor = ctx.actor;
    if !matches!(report.state, ReportState::Draft | ReportState::Rejected) {
        return Err(CoreError::Validation(format!(
            "A report in state {} cannot be submitted",
            report.state
        )));
    }
    if !report.is_author(actor.person_id) {
        return Err(CoreError::Forbidden(
            "Only authors may submit a report".into(),
        ));
    }
    let Some(primary_advisor) = report.primary_advisor_id else {
        return Err(CoreError::Validation(
            "A report needs a primary advisor before it can be submitted".into(),
        ));
    };
    if rules.require_engagement_date && report.engagement_date.is_none() {
        return Err(CoreError::Validation(
            "A report needs an engagement date before it can be submitted".into(),
        ));
    }

    let advisor_organization_id = ctx.directory.organization_for_person(primary_advisor);
    let mut candidate = report.clone();
    candidate.advisor_organization_id = advisor_organization_id;
    let stages = compose_for_report(ctx.directory, &candidate, ctx.now)?;

    report.advisor_organization_id = advisor_organization_id;
    report.stages = stages;
    report.workflow.push(WorkflowAction {
        action_type: ActionType::Submit,
        acting_person_id: actor.person_id,
        created_at: ctx.now,
        step: None,
        comment: None,
    });
    report.updated_at = ctx.now;

    Ok(enter_stage(report, 0, ctx.directory))
}

/// Approve the current stage and move on.
pub fn approve(
    report: &mut Report,
    input: &ApproveReport,
    ctx: &TransitionContext<'_>,
) -> Result<Transition, CoreError> {
    input.validate()?;
    let stage = current_stage(report, "approved")?;
    authorize_stage_action(report, &stage, ctx, "approve")?;

    report.workflow.push(WorkflowAction {
        action_type: ActionType::Approve,
        acting_person_id: ctx.actor.person_id,
        created_at: ctx.now,
        step: Some(stage),
        comment: input
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned),
    });
    report.updated_at = ctx.now;

    let next = report.current_stage.map_or(0, |idx| idx + 1);
    Ok(enter_stage(report, next, ctx.directory))
}

/// Reject the report back to its authors.
///
/// A pending report is rejected at its current stage. An administrator may
/// also reject an approved report; that action has no stage.
pub fn reject(
    report: &mut Report,
    input: &RejectReport,
    ctx: &TransitionContext<'_>,
) -> Result<Transition, CoreError> {
    input.validate()?;
    let comment = input.comment.trim();
    if comment.is_empty() {
        return Err(CoreError::Validation(
            "A rejection requires a comment".into(),
        ));
    }

    let step = match report.state {
        ReportState::PendingApproval => {
            let stage = current_stage(report, "rejected")?;
            authorize_stage_action(report, &stage, ctx, "reject")?;
            Some(stage)
        }
        ReportState::Approved if ctx.actor.is_admin => None,
        ReportState::Approved => {
            return Err(CoreError::Forbidden(
                "Only administrators may reject an approved report".into(),
            ));
        }
        state => {
            return Err(CoreError::Validation(format!(
                "A report in state {state} cannot be rejected"
            )));
        }
    };

    report.workflow.push(WorkflowAction {
        action_type: ActionType::Reject,
        acting_person_id: ctx.actor.person_id,
        created_at: ctx.now,
        step,
        comment: Some(comment.to_owned()),
    });
    report.state = ReportState::Rejected;
    report.current_stage = None;
    report.updated_at = ctx.now;

    Ok(Transition::notify(Notification::ReportRejected {
        report_id: report.id,
        rejected_by: ctx.actor.person_id,
        comment: comment.to_owned(),
        recipients: report.authors.clone(),
    }))
}

/// Publish an approved report. Administrators only.
pub fn publish(report: &mut Report, ctx: &TransitionContext<'_>) -> Result<Transition, CoreError> {
    require_admin(&ctx.actor, "publish")?;
    if report.state != ReportState::Approved {
        return Err(CoreError::Validation(format!(
            "A report in state {} cannot be published",
            report.state
        )));
    }
    if report.is_planned(ctx.now) {
        return Err(CoreError::Forbidden(
            "A planned engagement cannot be published".into(),
        ));
    }

    report.workflow.push(WorkflowAction {
        action_type: ActionType::Publish,
        acting_person_id: ctx.actor.person_id,
        created_at: ctx.now,
        step: None,
        comment: None,
    });
    report.state = ReportState::Published;
    report.released_at = Some(ctx.now);
    report.updated_at = ctx.now;

    Ok(Transition {
        notifications: Vec::new(),
        rollup: Some(RollupEvent::Published {
            report_id: report.id,
            advisor_organization_id: report.advisor_organization_id,
            at: ctx.now,
        }),
    })
}

/// Withdraw a published report back to draft. Administrators only.
pub fn unpublish(
    report: &mut Report,
    ctx: &TransitionContext<'_>,
) -> Result<Transition, CoreError> {
    require_admin(&ctx.actor, "unpublish")?;
    if report.state != ReportState::Published {
        return Err(CoreError::Validation(format!(
            "A report in state {} cannot be unpublished",
            report.state
        )));
    }

    report.workflow.push(WorkflowAction {
        action_type: ActionType::Unpublish,
        acting_person_id: ctx.actor.person_id,
        created_at: ctx.now,
        step: None,
        comment: None,
    });
    report.state = ReportState::Draft;
    report.released_at = None;
    report.current_stage = None;
    report.updated_at = ctx.now;

    Ok(Transition {
        notifications: Vec::new(),
        rollup: Some(RollupEvent::Unpublished {
            report_id: report.id,
            advisor_organization_id: report.advisor_organization_id,
            at: ctx.now,
        }),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// State a report ends in once no stage is left.
fn completion_state(report: &Report) -> ReportState {
    if report.cancelled_reason.is_some() {
        ReportState::Cancelled
    } else {
        ReportState::Approved
    }
}

/// Point the report at stage `index`, or finish it when the sequence is
/// exhausted.
fn enter_stage(report: &mut Report, index: usize, directory: &DirectorySnapshot) -> Transition {
    match report.stages.get(index).copied() {
        Some(stage) => {
            report.state = ReportState::PendingApproval;
            report.current_stage = Some(index);
            let approver_position_ids = live_approvers(directory, report, &stage)
                .iter()
                .map(|p| p.id)
                .collect();
            Transition::notify(Notification::ApprovalNeeded {
                report_id: report.id,
                stage,
                approver_position_ids,
            })
        }
        None => {
            report.state = completion_state(report);
            report.current_stage = None;
            Transition::none()
        }
    }
}

fn current_stage(report: &Report, verb: &str) -> Result<StageRef, CoreError> {
    if report.state != ReportState::PendingApproval {
        return Err(CoreError::Validation(format!(
            "A report in state {} cannot be {verb}",
            report.state
        )));
    }
    report.approval_step().copied().ok_or_else(|| {
        CoreError::Internal(format!(
            "Report {} is pending approval without a current stage",
            report.id
        ))
    })
}

fn authorize_stage_action(
    report: &Report,
    stage: &StageRef,
    ctx: &TransitionContext<'_>,
    verb: &str,
) -> Result<(), CoreError> {
    let actor = ctx.actor;
    if report.is_author(actor.person_id) && !actor.is_admin {
        return Err(CoreError::Forbidden(format!(
            "Authors cannot {verb} their own report"
        )));
    }
    if !can_act(ctx.directory, report, stage, &actor) {
        return Err(CoreError::Forbidden(format!(
            "Person {} is not an approver of the current stage",
            actor.person_id
        )));
    }
    Ok(())
}

fn require_admin(actor: &Actor, verb: &str) -> Result<(), CoreError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Only administrators may {verb} a report"
        )))
    }
}
