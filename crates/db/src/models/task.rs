//! Task models.

use anet_core::model::Task;
use anet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskRow {
    pub id: DbId,
    pub short_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TaskRow {
    pub fn into_domain(self, tasked_organization_ids: Vec<DbId>) -> Task {
        Task {
            id: self.id,
            short_name: self.short_name,
            tasked_organization_ids,
        }
    }
}

/// A row from the `task_tasked_organizations` join table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskedOrganizationRow {
    pub task_id: DbId,
    pub organization_id: DbId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub short_name: String,
    #[serde(default)]
    pub tasked_organization_ids: Vec<DbId>,
}
