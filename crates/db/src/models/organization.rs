//! Organization models.

use anet_core::model::Organization;
use anet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrganizationRow {
    pub id: DbId,
    pub short_name: String,
    pub parent_organization_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrganizationRow {
    pub fn into_domain(self) -> Organization {
        Organization {
            id: self.id,
            short_name: self.short_name,
            parent_id: self.parent_organization_id,
        }
    }
}

/// DTO for creating an organization.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrganization {
    pub short_name: String,
    pub parent_organization_id: Option<DbId>,
}
