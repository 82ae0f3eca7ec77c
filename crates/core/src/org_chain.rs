//! Effective organizational approval chain.
//!
//! The chain of the advisor organization is used if it has one; otherwise
//! the nearest ancestor with a chain; otherwise the chain of the default
//! approval organization.

use std::collections::HashSet;

use crate::approval_step::{ApprovalStep, ApprovalStepType, StepOwner};
use crate::directory::DirectorySnapshot;
use crate::error::CoreError;
use crate::settings::default_approval_organization;
use crate::types::DbId;

/// Resolve the organizational report-approval chain for an advisor
/// organization.
///
/// Fails with [`CoreError::Configuration`] only when the fallback to the
/// default approval organization is needed and that setting is unusable.
pub fn resolve(
    directory: &DirectorySnapshot,
    advisor_organization_id: Option<DbId>,
) -> Result<Vec<&ApprovalStep>, CoreError> {
    let mut visited = HashSet::new();
    let mut cursor = advisor_organization_id;

    while let Some(organization_id) = cursor {
        if !visited.insert(organization_id) {
            break;
        }
        let chain = directory.chain_for(
            StepOwner::Organization(organization_id),
            ApprovalStepType::ReportApproval,
        );
        if !chain.is_empty() {
            return Ok(chain);
        }
        cursor = directory
            .organization(organization_id)
            .and_then(|o| o.parent_id);
    }

    let default_id = default_approval_organization(directory)?;
    Ok(directory.chain_for(
        StepOwner::Organization(default_id),
        ApprovalStepType::ReportApproval,
    ))
}
