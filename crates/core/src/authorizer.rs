//! Who may act on a stage.
//!
//! Approvers are always resolved live by owner identity from the directory
//! snapshot of the current operation. A stage whose owner or step no longer
//! exists resolves to no approvers, which leaves it actionable by
//! administrators only.

use crate::approval_step::{StageRef, StepOwner};
use crate::directory::DirectorySnapshot;
use crate::model::Position;
use crate::report::Report;
use crate::roles::Actor;
use crate::task_filter::restricted_approvers;

/// The positions currently empowered to act on `stage` of `report`.
pub fn live_approvers<'a>(
    directory: &'a DirectorySnapshot,
    report: &Report,
    stage: &StageRef,
) -> Vec<&'a Position> {
    if !directory.owner_exists(stage.owner) {
        return Vec::new();
    }
    let Some(step) = directory.step(stage.step_id) else {
        return Vec::new();
    };
    if step.owner != stage.owner {
        return Vec::new();
    }

    match stage.owner {
        StepOwner::Task(task_id) if step.restricted_approval => match directory.task(task_id) {
            Some(task) => {
                restricted_approvers(directory, task, report.advisor_organization_id, step)
            }
            None => Vec::new(),
        },
        StepOwner::Organization(_) | StepOwner::Task(_) | StepOwner::Location(_) => step
            .approver_position_ids
            .iter()
            .filter_map(|id| directory.position(*id))
            .collect(),
    }
}

/// Whether `actor` may approve or reject `stage` of `report`.
///
/// Administrators satisfy every stage. Anyone else must currently hold one
/// of the stage's live approver positions.
pub fn can_act(
    directory: &DirectorySnapshot,
    report: &Report,
    stage: &StageRef,
    actor: &Actor,
) -> bool {
    if actor.is_admin {
        return true;
    }
    live_approvers(directory, report, stage)
        .iter()
        .any(|position| position.person_id == Some(actor.person_id))
}
