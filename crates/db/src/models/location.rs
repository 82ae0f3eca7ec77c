use anet_core::model::Location;
use anet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `locations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LocationRow {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LocationRow {
    pub fn into_domain(self) -> Location {
        Location {
            id: self.id,
            name: self.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLocation {
    pub name: String,
}
