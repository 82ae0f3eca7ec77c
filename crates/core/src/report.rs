//! Reports, their lifecycle states and the workflow action log.

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::approval_step::StageRef;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STATE_DRAFT: &str = "DRAFT";
pub const STATE_PENDING_APPROVAL: &str = "PENDING_APPROVAL";
pub const STATE_APPROVED: &str = "APPROVED";
pub const STATE_REJECTED: &str = "REJECTED";
pub const STATE_CANCELLED: &str = "CANCELLED";
pub const STATE_PUBLISHED: &str = "PUBLISHED";

/// All valid report state values.
pub const VALID_STATES: &[&str] = &[
    STATE_DRAFT,
    STATE_PENDING_APPROVAL,
    STATE_APPROVED,
    STATE_REJECTED,
    STATE_CANCELLED,
    STATE_PUBLISHED,
];

pub const ACTION_SUBMIT: &str = "SUBMIT";
pub const ACTION_APPROVE: &str = "APPROVE";
pub const ACTION_REJECT: &str = "REJECT";
pub const ACTION_PUBLISH: &str = "PUBLISH";
pub const ACTION_UNPUBLISH: &str = "UNPUBLISH";

/// All valid workflow action type values.
pub const VALID_ACTION_TYPES: &[&str] = &[
    ACTION_SUBMIT,
    ACTION_APPROVE,
    ACTION_REJECT,
    ACTION_PUBLISH,
    ACTION_UNPUBLISH,
];

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportState {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Cancelled,
    Published,
}

impl ReportState {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            STATE_DRAFT => Ok(Self::Draft),
            STATE_PENDING_APPROVAL => Ok(Self::PendingApproval),
            STATE_APPROVED => Ok(Self::Approved),
            STATE_REJECTED => Ok(Self::Rejected),
            STATE_CANCELLED => Ok(Self::Cancelled),
            STATE_PUBLISHED => Ok(Self::Published),
            _ => Err(format!(
                "Invalid report state '{s}'. Must be one of: {}",
                VALID_STATES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => STATE_DRAFT,
            Self::PendingApproval => STATE_PENDING_APPROVAL,
            Self::Approved => STATE_APPROVED,
            Self::Rejected => STATE_REJECTED,
            Self::Cancelled => STATE_CANCELLED,
            Self::Published => STATE_PUBLISHED,
        }
    }
}

impl std::fmt::Display for ReportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Submit,
    Approve,
    Reject,
    Publish,
    Unpublish,
}

impl ActionType {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            ACTION_SUBMIT => Ok(Self::Submit),
            ACTION_APPROVE => Ok(Self::Approve),
            ACTION_REJECT => Ok(Self::Reject),
            ACTION_PUBLISH => Ok(Self::Publish),
            ACTION_UNPUBLISH => Ok(Self::Unpublish),
            _ => Err(format!(
                "Invalid action type '{s}'. Must be one of: {}",
                VALID_ACTION_TYPES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => ACTION_SUBMIT,
            Self::Approve => ACTION_APPROVE,
            Self::Reject => ACTION_REJECT,
            Self::Publish => ACTION_PUBLISH,
            Self::Unpublish => ACTION_UNPUBLISH,
        }
    }
}

// ---------------------------------------------------------------------------
// Structs
// ---------------------------------------------------------------------------

/// An immutable entry of a report's workflow log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAction {
    pub action_type: ActionType,
    pub acting_person_id: DbId,
    pub created_at: Timestamp,
    /// The stage acted upon. `None` for SUBMIT, PUBLISH, UNPUBLISH and for a
    /// rejection of an already approved report.
    pub step: Option<StageRef>,
    pub comment: Option<String>,
}

/// An engagement report and its approval state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: DbId,
    pub state: ReportState,
    pub intent: String,
    pub report_text: Option<String>,
    pub engagement_date: Option<Timestamp>,
    /// Present when the report records an engagement that was cancelled.
    pub cancelled_reason: Option<String>,
    /// Never empty.
    pub authors: Vec<DbId>,
    pub primary_advisor_id: Option<DbId>,
    /// Derived from the primary advisor's position; not set by callers.
    pub advisor_organization_id: Option<DbId>,
    pub task_ids: Vec<DbId>,
    pub location_id: Option<DbId>,
    /// Stage sequence frozen by the last successful submit.
    pub stages: Vec<StageRef>,
    /// Index into `stages` while pending approval.
    pub current_stage: Option<usize>,
    /// Append-only.
    pub workflow: Vec<WorkflowAction>,
    pub released_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Report {
    /// A new draft. The store assigns the real id on insert.
    pub fn new_draft(input: CreateReport, creator_id: DbId, now: Timestamp) -> Self {
        let mut authors = unique_ids(input.authors);
        if authors.is_empty() {
            authors.push(creator_id);
        }
        let task_ids = unique_ids(input.task_ids);
        Self {
            id: 0,
            state: ReportState::Draft,
            intent: input.intent,
            report_text: input.report_text,
            engagement_date: input.engagement_date,
            cancelled_reason: input.cancelled_reason,
            authors,
            primary_advisor_id: input.primary_advisor_id,
            advisor_organization_id: None,
            task_ids,
            location_id: input.location_id,
            stages: Vec::new(),
            current_stage: None,
            workflow: Vec::new(),
            released_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_author(&self, person_id: DbId) -> bool {
        self.authors.contains(&person_id)
    }

    /// Whether the engagement lies in the future relative to `now`.
    pub fn is_planned(&self, now: Timestamp) -> bool {
        crate::workflow::is_planned(self.engagement_date, now)
    }

    /// The stage currently awaiting approval.
    pub fn approval_step(&self) -> Option<&StageRef> {
        self.current_stage.and_then(|idx| self.stages.get(idx))
    }

    /// Actions of the current submission cycle: everything from the last
    /// SUBMIT on, or the whole log if the report was never submitted.
    pub fn current_cycle(&self) -> &[WorkflowAction] {
        let start = self
            .workflow
            .iter()
            .rposition(|a| a.action_type == ActionType::Submit)
            .unwrap_or(0);
        &self.workflow[start..]
    }
}

/// Drop repeated ids, keeping first occurrences in order.
pub(crate) fn unique_ids(ids: impl IntoIterator<Item = DbId>) -> Vec<DbId> {
    let mut unique = Vec::new();
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Input for creating a report.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateReport {
    #[validate(length(min = 1, max = 1000))]
    pub intent: String,
    pub report_text: Option<String>,
    pub engagement_date: Option<Timestamp>,
    pub cancelled_reason: Option<String>,
    /// Defaults to the creator when empty.
    #[serde(default)]
    pub authors: Vec<DbId>,
    pub primary_advisor_id: Option<DbId>,
    #[serde(default)]
    pub task_ids: Vec<DbId>,
    pub location_id: Option<DbId>,
}

/// Partial update of a report. `None` leaves a field unchanged.
///
/// Nullable fields use `Option<Option<T>>`: `Some(None)` (a JSON `null`)
/// clears the value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReport {
    #[validate(length(min = 1, max = 1000))]
    pub intent: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub report_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub engagement_date: Option<Option<Timestamp>>,
    #[serde(default, deserialize_with = "present")]
    pub cancelled_reason: Option<Option<String>>,
    pub authors: Option<Vec<DbId>>,
    #[serde(default, deserialize_with = "present")]
    pub primary_advisor_id: Option<Option<DbId>>,
    pub task_ids: Option<Vec<DbId>>,
    #[serde(default, deserialize_with = "present")]
    pub location_id: Option<Option<DbId>>,
}

// A key that is present, even as `null`, is `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request body for approving the current stage.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ApproveReport {
    #[validate(length(max = 4000))]
    pub comment: Option<String>,
    /// Version the caller last saw; a mismatch fails early with a conflict.
    pub version: Option<i64>,
}

/// Request body for rejecting a report. The comment is mandatory.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RejectReport {
    #[validate(length(min = 1, max = 4000))]
    pub comment: String,
    pub version: Option<i64>,
}
