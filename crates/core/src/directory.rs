//! Point-in-time view of the approval configuration.
//!
//! A [`DirectorySnapshot`] holds organizations, positions, tasks, locations,
//! approval steps and admin settings as they were when it was loaded. The
//! engine loads a fresh snapshot for every operation and never keeps one
//! across operations, so every evaluation sees current configuration while
//! staying consistent within itself.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::approval_step::{order_chain, ApprovalStep, ApprovalStepType, StepOwner};
use crate::model::{Location, Organization, Position, Task};
use crate::types::DbId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    organizations: HashMap<DbId, Organization>,
    positions: HashMap<DbId, Position>,
    tasks: HashMap<DbId, Task>,
    locations: HashMap<DbId, Location>,
    /// Keyed by id so chain walks that fall back to storage order are
    /// deterministic.
    steps: BTreeMap<DbId, ApprovalStep>,
    settings: HashMap<String, String>,
}

impl DirectorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    // -- lookups ------------------------------------------------------------

    pub fn organization(&self, id: DbId) -> Option<&Organization> {
        self.organizations.get(&id)
    }

    pub fn position(&self, id: DbId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn task(&self, id: DbId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn location(&self, id: DbId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn step(&self, id: DbId) -> Option<&ApprovalStep> {
        self.steps.get(&id)
    }

    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    /// The position a person currently holds, if any. When bad data gives a
    /// person several positions the lowest position id wins.
    pub fn position_for_person(&self, person_id: DbId) -> Option<&Position> {
        self.positions
            .values()
            .filter(|p| p.person_id == Some(person_id))
            .min_by_key(|p| p.id)
    }

    /// The organization of the position a person currently holds.
    pub fn organization_for_person(&self, person_id: DbId) -> Option<DbId> {
        self.position_for_person(person_id)
            .and_then(|p| p.organization_id)
    }

    /// Whether the owner entity of a step still exists.
    pub fn owner_exists(&self, owner: StepOwner) -> bool {
        match owner {
            StepOwner::Organization(id) => self.organizations.contains_key(&id),
            StepOwner::Task(id) => self.tasks.contains_key(&id),
            StepOwner::Location(id) => self.locations.contains_key(&id),
        }
    }

    /// The ordered chain of one owner and step type.
    pub fn chain_for(&self, owner: StepOwner, step_type: ApprovalStepType) -> Vec<&ApprovalStep> {
        let steps: Vec<&ApprovalStep> = self
            .steps
            .values()
            .filter(|s| s.owner == owner && s.step_type == step_type)
            .collect();
        order_chain(&steps)
    }

    /// The organization and all of its ancestors, nearest first.
    ///
    /// Stops at a missing parent or at an organization already visited.
    pub fn ancestors_or_self(&self, organization_id: DbId) -> Vec<DbId> {
        let mut seen = HashSet::new();
        let mut chain = Vec::new();
        let mut cursor = Some(organization_id);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                break;
            }
            chain.push(id);
            cursor = self.organizations.get(&id).and_then(|o| o.parent_id);
        }
        chain
    }

    /// Whether `organization_id` lies in the subtree rooted at `root_id`.
    pub fn is_self_or_descendant(&self, organization_id: DbId, root_id: DbId) -> bool {
        self.ancestors_or_self(organization_id).contains(&root_id)
    }

    // -- mutation -----------------------------------------------------------

    pub fn insert_organization(&mut self, organization: Organization) {
        self.organizations.insert(organization.id, organization);
    }

    pub fn insert_position(&mut self, position: Position) {
        self.positions.insert(position.id, position);
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub fn insert_location(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    pub fn insert_step(&mut self, step: ApprovalStep) {
        self.steps.insert(step.id, step);
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.settings.insert(key.into(), value.into());
    }

    pub fn remove_setting(&mut self, key: &str) -> Option<String> {
        self.settings.remove(key)
    }

    pub fn task_mut(&mut self, id: DbId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn step_mut(&mut self, id: DbId) -> Option<&mut ApprovalStep> {
        self.steps.get_mut(&id)
    }

    pub fn position_mut(&mut self, id: DbId) -> Option<&mut Position> {
        self.positions.get_mut(&id)
    }

    /// Remove a task together with the steps it owns.
    pub fn remove_task(&mut self, id: DbId) -> Option<Task> {
        self.steps.retain(|_, s| s.owner != StepOwner::Task(id));
        self.tasks.remove(&id)
    }

    pub fn remove_step(&mut self, id: DbId) -> Option<ApprovalStep> {
        self.steps.remove(&id)
    }
}
