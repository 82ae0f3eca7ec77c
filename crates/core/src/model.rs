//! Configuration entities the workflow engine reads: organizations,
//! positions, tasks and locations.
//!
//! Approval steps are not embedded here; they are kept in the directory keyed
//! by their owner (see [`crate::approval_step::StepOwner`]) so that a report
//! can always re-query them by owner identity.

use serde::{Deserialize, Serialize};

use crate::roles::PositionType;
use crate::types::DbId;

/// A node in the organization tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: DbId,
    pub short_name: String,
    pub parent_id: Option<DbId>,
}

/// The unit of "who may approve". Holds at most one person at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: DbId,
    pub name: String,
    pub organization_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub position_type: PositionType,
}

/// A task that reports can be linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: DbId,
    pub short_name: String,
    pub tasked_organization_ids: Vec<DbId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: DbId,
    pub name: String,
}
