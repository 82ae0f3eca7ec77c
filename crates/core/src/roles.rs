//! Position types and the acting person of an operation.
//!
//! Administrator status is not carried by the caller: it is derived from the
//! type of the position the person currently holds, looked up in the same
//! directory snapshot the operation evaluates against.

use serde::{Deserialize, Serialize};

use crate::directory::DirectorySnapshot;
use crate::types::DbId;

pub const POSITION_REGULAR: &str = "REGULAR";
pub const POSITION_SUPERUSER: &str = "SUPERUSER";
pub const POSITION_ADMINISTRATOR: &str = "ADMINISTRATOR";

/// All valid position type values.
pub const VALID_POSITION_TYPES: &[&str] =
    &[POSITION_REGULAR, POSITION_SUPERUSER, POSITION_ADMINISTRATOR];

/// Kind of a position. Only `Administrator` carries workflow privileges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionType {
    #[default]
    Regular,
    Superuser,
    Administrator,
}

impl PositionType {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        match s {
            POSITION_REGULAR => Ok(Self::Regular),
            POSITION_SUPERUSER => Ok(Self::Superuser),
            POSITION_ADMINISTRATOR => Ok(Self::Administrator),
            _ => Err(format!(
                "Invalid position type '{s}'. Must be one of: {}",
                VALID_POSITION_TYPES.join(", ")
            )),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => POSITION_REGULAR,
            Self::Superuser => POSITION_SUPERUSER,
            Self::Administrator => POSITION_ADMINISTRATOR,
        }
    }
}

/// The person performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub person_id: DbId,
    pub is_admin: bool,
}

impl Actor {
    /// Resolve a person against the directory. A person holding no position
    /// acts as a regular user.
    pub fn resolve(directory: &DirectorySnapshot, person_id: DbId) -> Self {
        let is_admin = directory
            .position_for_person(person_id)
            .is_some_and(|p| p.position_type == PositionType::Administrator);
        Self {
            person_id,
            is_admin,
        }
    }
}
