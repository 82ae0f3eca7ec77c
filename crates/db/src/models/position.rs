//! Position models.

use anet_core::error::CoreError;
use anet_core::model::Position;
use anet_core::roles::PositionType;
use anet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::corrupt;

/// A row from the `positions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PositionRow {
    pub id: DbId,
    pub name: String,
    pub organization_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub position_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PositionRow {
    pub fn into_domain(self) -> Result<Position, CoreError> {
        let position_type = PositionType::from_str_value(&self.position_type)
            .map_err(|e| corrupt("positions", self.id, e))?;
        Ok(Position {
            id: self.id,
            name: self.name,
            organization_id: self.organization_id,
            person_id: self.person_id,
            position_type,
        })
    }
}

/// DTO for creating a position. `position_type` defaults to `REGULAR`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePosition {
    pub name: String,
    pub organization_id: Option<DbId>,
    pub person_id: Option<DbId>,
    pub position_type: Option<String>,
}
