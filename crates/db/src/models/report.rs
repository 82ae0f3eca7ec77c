//! Report models: the report row, its frozen stages and its action log.

use anet_core::approval_step::{StageRef, StepOwner};
use anet_core::error::CoreError;
use anet_core::report::{ActionType, Report, ReportState, WorkflowAction};
use anet_core::store::Versioned;
use anet_core::types::{DbId, Timestamp, Version};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::corrupt;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportRow {
    pub id: DbId,
    pub state: String,
    pub intent: String,
    pub report_text: Option<String>,
    pub engagement_date: Option<Timestamp>,
    pub cancelled_reason: Option<String>,
    pub primary_advisor_id: Option<DbId>,
    pub advisor_organization_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub current_stage: Option<i32>,
    pub released_at: Option<Timestamp>,
    pub version: Version,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `report_stages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportStageRow {
    pub report_id: DbId,
    pub sequence: i32,
    pub approval_step_id: DbId,
    pub owner_type: String,
    pub owner_id: DbId,
}

impl ReportStageRow {
    pub fn into_domain(self) -> Result<StageRef, CoreError> {
        let owner = StepOwner::from_parts(&self.owner_type, self.owner_id)
            .map_err(|e| corrupt("report_stages", self.report_id, e))?;
        Ok(StageRef {
            step_id: self.approval_step_id,
            owner,
        })
    }
}

/// A row from the `report_actions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportActionRow {
    pub id: DbId,
    pub report_id: DbId,
    pub sequence: i32,
    pub action_type: String,
    pub acting_person_id: DbId,
    pub approval_step_id: Option<DbId>,
    pub owner_type: Option<String>,
    pub owner_id: Option<DbId>,
    pub comment: Option<String>,
    pub created_at: Timestamp,
}

impl ReportActionRow {
    pub fn into_domain(self) -> Result<WorkflowAction, CoreError> {
        let action_type = ActionType::from_str_value(&self.action_type)
            .map_err(|e| corrupt("report_actions", self.id, e))?;
        let step = match (self.approval_step_id, self.owner_type.as_deref(), self.owner_id) {
            (Some(step_id), Some(kind), Some(owner_id)) => Some(StageRef {
                step_id,
                owner: StepOwner::from_parts(kind, owner_id)
                    .map_err(|e| corrupt("report_actions", self.id, e))?,
            }),
            (None, None, None) => None,
            _ => {
                return Err(corrupt(
                    "report_actions",
                    self.id,
                    "partial stage reference".to_string(),
                ))
            }
        };
        Ok(WorkflowAction {
            action_type,
            acting_person_id: self.acting_person_id,
            created_at: self.created_at,
            step,
            comment: self.comment,
        })
    }
}

/// Child rows of a report, each list in stored order.
#[derive(Debug, Clone, Default)]
pub struct ReportChildren {
    pub authors: Vec<DbId>,
    pub task_ids: Vec<DbId>,
    pub stages: Vec<ReportStageRow>,
    pub actions: Vec<ReportActionRow>,
}

impl ReportRow {
    /// Assemble the domain report from its row and child rows.
    pub fn into_domain(self, children: ReportChildren) -> Result<Versioned<Report>, CoreError> {
        let state = ReportState::from_str_value(&self.state)
            .map_err(|e| corrupt("reports", self.id, e))?;
        let current_stage = self
            .current_stage
            .map(|idx| {
                usize::try_from(idx)
                    .map_err(|_| corrupt("reports", self.id, format!("negative stage index {idx}")))
            })
            .transpose()?;
        let stages = children
            .stages
            .into_iter()
            .map(ReportStageRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let workflow = children
            .actions
            .into_iter()
            .map(ReportActionRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Versioned {
            value: Report {
                id: self.id,
                state,
                intent: self.intent,
                report_text: self.report_text,
                engagement_date: self.engagement_date,
                cancelled_reason: self.cancelled_reason,
                authors: children.authors,
                primary_advisor_id: self.primary_advisor_id,
                advisor_organization_id: self.advisor_organization_id,
                task_ids: children.task_ids,
                location_id: self.location_id,
                stages,
                current_stage,
                workflow,
                released_at: self.released_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            version: self.version,
        })
    }
}
