//! Selection of the approval steps of a task that apply to a report.
//!
//! Unrestricted steps always apply. A restricted step applies only when at
//! least one of its approvers belongs to the subtree of an *eligible* tasked
//! organization: one of the task's tasked organizations that is the report's
//! advisor organization or one of its ancestors. This lets one task-level
//! approver list serve many advisor organizations without per-report
//! curation.

use std::collections::HashSet;

use crate::approval_step::{ApprovalStep, ApprovalStepType, StepOwner};
use crate::directory::DirectorySnapshot;
use crate::model::{Position, Task};
use crate::types::DbId;

/// The steps of `task` that apply to a report with the given advisor
/// organization, in chain order.
pub fn filter<'a>(
    directory: &'a DirectorySnapshot,
    task: &Task,
    advisor_organization_id: Option<DbId>,
    is_planned: bool,
) -> Vec<&'a ApprovalStep> {
    let step_type = ApprovalStepType::for_engagement(is_planned);
    directory
        .chain_for(StepOwner::Task(task.id), step_type)
        .into_iter()
        .filter(|step| {
            !step.restricted_approval
                || !restricted_approvers(directory, task, advisor_organization_id, step).is_empty()
        })
        .collect()
}

/// Tasked organizations of `task` that are self-or-ancestor of the advisor
/// organization.
pub fn eligible_tasked_organizations(
    directory: &DirectorySnapshot,
    task: &Task,
    advisor_organization_id: Option<DbId>,
) -> HashSet<DbId> {
    let Some(advisor_id) = advisor_organization_id else {
        return HashSet::new();
    };
    let ancestry: HashSet<DbId> = directory.ancestors_or_self(advisor_id).into_iter().collect();
    task.tasked_organization_ids
        .iter()
        .copied()
        .filter(|id| ancestry.contains(id))
        .collect()
}

/// Approver positions of a restricted step that sit under an eligible tasked
/// organization. Positions missing from the directory are skipped.
pub fn restricted_approvers<'a>(
    directory: &'a DirectorySnapshot,
    task: &Task,
    advisor_organization_id: Option<DbId>,
    step: &ApprovalStep,
) -> Vec<&'a Position> {
    let eligible = eligible_tasked_organizations(directory, task, advisor_organization_id);
    if eligible.is_empty() {
        return Vec::new();
    }
    step.approver_position_ids
        .iter()
        .filter_map(|id| directory.position(*id))
        .filter(|position| {
            position.organization_id.is_some_and(|org_id| {
                directory
                    .ancestors_or_self(org_id)
                    .iter()
                    .any(|ancestor| eligible.contains(ancestor))
            })
        })
        .collect()
}
