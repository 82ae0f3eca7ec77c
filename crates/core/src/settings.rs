//! Administrative settings consumed by the workflow engine.

use crate::directory::DirectorySnapshot;
use crate::error::CoreError;
use crate::types::DbId;

/// Admin setting naming the organization whose approval chain is used when
/// no organization in a report's ancestry has one.
pub const DEFAULT_APPROVAL_ORGANIZATION: &str = "DEFAULT_APPROVAL_ORGANIZATION";

/// Read and check the default approval organization.
///
/// The setting is validated here, at use time, not when it is saved: an
/// absent, blank, unparsable or dangling value is a configuration error an
/// administrator has to fix.
pub fn default_approval_organization(directory: &DirectorySnapshot) -> Result<DbId, CoreError> {
    let raw = directory
        .setting(DEFAULT_APPROVAL_ORGANIZATION)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            CoreError::Configuration(format!("{DEFAULT_APPROVAL_ORGANIZATION} is not set"))
        })?;

    let id: DbId = raw.parse().map_err(|_| {
        CoreError::Configuration(format!(
            "{DEFAULT_APPROVAL_ORGANIZATION} '{raw}' is not an organization id"
        ))
    })?;

    if directory.organization(id).is_none() {
        return Err(CoreError::Configuration(format!(
            "{DEFAULT_APPROVAL_ORGANIZATION} names organization {id}, which does not exist"
        )));
    }
    Ok(id)
}
