//! Outward notifications and rollup events.
//!
//! The engine only decides that something must be announced and to whom.
//! Delivery belongs to implementations of [`NotificationTrigger`] and
//! [`RollupSink`], which are invoked after the triggering change has been
//! stored.

use serde::Serialize;

use crate::approval_step::StageRef;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A stage became current and its approvers have to act.
    ApprovalNeeded {
        report_id: DbId,
        stage: StageRef,
        /// Live approver positions at the time the stage became current.
        /// May be empty, in which case only an administrator can act.
        approver_position_ids: Vec<DbId>,
    },
    /// The report was sent back to its authors.
    ReportRejected {
        report_id: DbId,
        rejected_by: DbId,
        comment: String,
        recipients: Vec<DbId>,
    },
    /// A non-author changed a report under approval and returned it to draft.
    ReportEdited {
        report_id: DbId,
        editor: DbId,
        recipients: Vec<DbId>,
    },
}

impl Notification {
    pub fn report_id(&self) -> DbId {
        match self {
            Self::ApprovalNeeded { report_id, .. }
            | Self::ReportRejected { report_id, .. }
            | Self::ReportEdited { report_id, .. } => *report_id,
        }
    }
}

/// Publication changes reported to the daily rollup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RollupEvent {
    Published {
        report_id: DbId,
        advisor_organization_id: Option<DbId>,
        at: Timestamp,
    },
    Unpublished {
        report_id: DbId,
        advisor_organization_id: Option<DbId>,
        at: Timestamp,
    },
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Receives notifications decided by the engine.
///
/// Implementations must not block: the engine calls them inline after a
/// successful write. Delivery failures are the implementation's concern.
pub trait NotificationTrigger: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Receives publication changes for rollup reporting.
pub trait RollupSink: Send + Sync {
    fn record(&self, event: &RollupEvent);
}

/// Discards everything. For embedders that have no delivery channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationTrigger for NoopNotifier {
    fn notify(&self, _notification: &Notification) {}
}

impl RollupSink for NoopNotifier {
    fn record(&self, _event: &RollupEvent) {}
}
