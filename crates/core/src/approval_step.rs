//! Approval steps, their owners, and chain ordering.
//!
//! Every step belongs to exactly one owner: an organization, a task or a
//! location. Steps of one owner and type form a singly linked chain through
//! `next_step_id`. A report never stores a step's approvers; it stores a
//! [`StageRef`] and re-reads the step through its owner whenever approvers
//! are needed.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STEP_TYPE_REPORT_APPROVAL: &str = "REPORT_APPROVAL";
pub const STEP_TYPE_PLANNING_APPROVAL: &str = "PLANNING_APPROVAL";

/// All valid approval step type values.
pub const VALID_STEP_TYPES: &[&str] = &[STEP_TYPE_REPORT_APPROVAL, STEP_TYPE_PLANNING_APPROVAL];

pub const OWNER_ORGANIZATION: &str = "organization";
pub const OWNER_TASK: &str = "task";
pub const OWNER_LOCATION: &str = "location";

/// All valid owner kind values.
pub const VALID_OWNER_KINDS: &[&str] = &[OWNER_ORGANIZATION, OWNER_TASK, OWNER_LOCATION];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which chain a step belongs to. Planning steps apply to engagements that
/// have not happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStepType {
    ReportApproval,
    PlanningApproval,
}

impl ApprovalStepType {
    /// Chain type to use for an engagement.
    pub fn for_engagement(is_planned: bool) -> Self {
        if is_planned {
            Self::PlanningApproval
        } else {
            Self::ReportApproval
        }
    }

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STEP_TYPE_REPORT_APPROVAL => Ok(Self::ReportApproval),
            STEP_TYPE_PLANNING_APPROVAL => Ok(Self::PlanningApproval),
            _ => Err(format!(
                "Invalid approval step type '{s}'. Must be one of: {}",
                VALID_STEP_TYPES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReportApproval => STEP_TYPE_REPORT_APPROVAL,
            Self::PlanningApproval => STEP_TYPE_PLANNING_APPROVAL,
        }
    }
}

/// The entity an approval step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum StepOwner {
    Organization(DbId),
    Task(DbId),
    Location(DbId),
}

impl StepOwner {
    /// Build an owner from its stored kind and id.
    pub fn from_parts(kind: &str, id: DbId) -> Result<Self, String> {
        match kind {
            OWNER_ORGANIZATION => Ok(Self::Organization(id)),
            OWNER_TASK => Ok(Self::Task(id)),
            OWNER_LOCATION => Ok(Self::Location(id)),
            _ => Err(format!(
                "Invalid step owner kind '{kind}'. Must be one of: {}",
                VALID_OWNER_KINDS.join(", ")
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Organization(_) => OWNER_ORGANIZATION,
            Self::Task(_) => OWNER_TASK,
            Self::Location(_) => OWNER_LOCATION,
        }
    }

    pub fn id(&self) -> DbId {
        match self {
            Self::Organization(id) | Self::Task(id) | Self::Location(id) => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// One link in an approval chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    pub id: DbId,
    pub owner: StepOwner,
    pub name: String,
    pub step_type: ApprovalStepType,
    /// Only meaningful for task-owned steps: the step applies only when one
    /// of its approvers sits under an organization tasked with the task.
    pub restricted_approval: bool,
    pub next_step_id: Option<DbId>,
    pub approver_position_ids: Vec<DbId>,
}

impl ApprovalStep {
    pub fn stage_ref(&self) -> StageRef {
        StageRef {
            step_id: self.id,
            owner: self.owner,
        }
    }
}

/// A frozen reference to a stage of a report's workflow.
///
/// Only identities are stored. Name and approvers are re-read from the
/// owner on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageRef {
    pub step_id: DbId,
    pub owner: StepOwner,
}

// ---------------------------------------------------------------------------
// Chain ordering
// ---------------------------------------------------------------------------

/// Order the steps of one chain by following `next_step_id` links.
///
/// Walks start from chain heads (steps no other step of the chain points
/// to) in input order. A walk stops at a link leaving the chain or at an
/// already visited step, so cyclic data terminates. Any step not reached
/// from a head starts a walk of its own, so every input step appears exactly
/// once in the output.
pub fn order_chain<'a>(steps: &[&'a ApprovalStep]) -> Vec<&'a ApprovalStep> {
    let by_id: HashMap<DbId, &'a ApprovalStep> = steps.iter().map(|s| (s.id, *s)).collect();
    let pointed_to: HashSet<DbId> = steps
        .iter()
        .filter_map(|s| s.next_step_id)
        .filter(|id| by_id.contains_key(id))
        .collect();

    let heads = steps.iter().filter(|s| !pointed_to.contains(&s.id));
    let mut visited = HashSet::with_capacity(steps.len());
    let mut ordered = Vec::with_capacity(steps.len());

    for start in heads.chain(steps.iter()) {
        let mut cursor = Some(*start);
        while let Some(step) = cursor {
            if !visited.insert(step.id) {
                break;
            }
            ordered.push(step);
            cursor = step.next_step_id.and_then(|next| by_id.get(&next).copied());
        }
    }

    ordered
}
