//! Approval step models.

use anet_core::approval_step::{ApprovalStep, ApprovalStepType, StepOwner};
use anet_core::error::CoreError;
use anet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::corrupt;

/// A row from the `approval_steps` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalStepRow {
    pub id: DbId,
    pub owner_type: String,
    pub owner_id: DbId,
    pub name: String,
    pub step_type: String,
    pub restricted_approval: bool,
    pub next_step_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ApprovalStepRow {
    pub fn into_domain(self, approver_position_ids: Vec<DbId>) -> Result<ApprovalStep, CoreError> {
        let owner = StepOwner::from_parts(&self.owner_type, self.owner_id)
            .map_err(|e| corrupt("approval_steps", self.id, e))?;
        let step_type = ApprovalStepType::from_str_value(&self.step_type)
            .map_err(|e| corrupt("approval_steps", self.id, e))?;
        Ok(ApprovalStep {
            id: self.id,
            owner,
            name: self.name,
            step_type,
            restricted_approval: self.restricted_approval,
            next_step_id: self.next_step_id,
            approver_position_ids,
        })
    }
}

/// A row from the `approvers` join table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApproverRow {
    pub approval_step_id: DbId,
    pub position_id: DbId,
}

/// DTO for creating an approval step.
///
/// The step is appended to nothing: callers link chains explicitly through
/// `next_step_id` or [`ApprovalStepRepo::set_next`](crate::repositories::ApprovalStepRepo::set_next).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApprovalStep {
    pub owner: StepOwner,
    pub name: String,
    pub step_type: ApprovalStepType,
    #[serde(default)]
    pub restricted_approval: bool,
    pub next_step_id: Option<DbId>,
    #[serde(default)]
    pub approver_position_ids: Vec<DbId>,
}
