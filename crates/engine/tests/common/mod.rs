#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anet_core::approval_step::{ApprovalStep, ApprovalStepType, StepOwner};
use anet_core::directory::DirectorySnapshot;
use anet_core::model::{Location, Organization, Position, Task};
use anet_core::notification::{Notification, NotificationTrigger, RollupEvent, RollupSink};
use anet_core::report::CreateReport;
use anet_core::roles::PositionType;
use anet_core::settings::DEFAULT_APPROVAL_ORGANIZATION;
use anet_core::types::{DbId, Timestamp};
use anet_engine::{FixedClock, InMemoryDirectory, InMemoryReportStore, ReportEngine, WorkflowConfig};
use chrono::{Duration, TimeZone, Utc};

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// Regular user in EF 1.1.
pub const AUTHOR: DbId = 100;
/// Holds the first EF 1 step.
pub const S1_APPROVER: DbId = 101;
/// Holds the second EF 1 step.
pub const S2_APPROVER: DbId = 102;
pub const ADMIN: DbId = 103;
/// Holds the default organization's step.
pub const DEFAULT_APPROVER: DbId = 104;
/// Sits in EF 1.1, inside the subtree of the task's tasked organization.
pub const TASK_APPROVER_IN: DbId = 105;
/// Sits in EF 2, outside the task's tasked subtree.
pub const TASK_APPROVER_OUT: DbId = 106;
/// Regular user in EF 2, which has no approval chain.
pub const EF2_AUTHOR: DbId = 107;

// ---------------------------------------------------------------------------
// Configuration ids
// ---------------------------------------------------------------------------

pub const ORG_DEFAULT: DbId = 1;
pub const ORG_EF1: DbId = 10;
pub const ORG_EF1_1: DbId = 11;
pub const ORG_EF2: DbId = 20;

pub const STEP_EF1_REVIEW: DbId = 500;
pub const STEP_EF1_SIGNOFF: DbId = 501;
pub const STEP_DEFAULT: DbId = 900;

pub const TASK: DbId = 60;
pub const STEP_TASK_OPEN: DbId = 600;
pub const STEP_TASK_RESTRICTED: DbId = 601;
pub const STEP_TASK_PLANNING: DbId = 602;

pub const LOCATION: DbId = 70;
pub const STEP_LOCATION: DbId = 700;

/// Position held by a person in the fixture: position id = person id + 900.
pub fn position_of(person: DbId) -> DbId {
    person + 900
}

pub fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

fn step(
    id: DbId,
    owner: StepOwner,
    name: &str,
    step_type: ApprovalStepType,
    next: Option<DbId>,
    approvers: &[DbId],
) -> ApprovalStep {
    ApprovalStep {
        id,
        owner,
        name: name.to_string(),
        step_type,
        restricted_approval: false,
        next_step_id: next,
        approver_position_ids: approvers.iter().map(|p| position_of(*p)).collect(),
    }
}

/// Organizations:
///
/// ```text
/// 1  ANET Default   (default approval organization, step 900)
/// 10 EF 1           (steps 500 -> 501)
/// └── 11 EF 1.1     (no steps)
/// 20 EF 2           (no steps)
/// ```
///
/// Task 60 is tasked to EF 1 and has no steps until a test adds them.
pub fn base_directory() -> DirectorySnapshot {
    let mut dir = DirectorySnapshot::new();
    for (id, name, parent) in [
        (ORG_DEFAULT, "ANET Default", None),
        (ORG_EF1, "EF 1", None),
        (ORG_EF1_1, "EF 1.1", Some(ORG_EF1)),
        (ORG_EF2, "EF 2", None),
    ] {
        dir.insert_organization(Organization {
            id,
            short_name: name.to_string(),
            parent_id: parent,
        });
    }
    dir.set_setting(DEFAULT_APPROVAL_ORGANIZATION, ORG_DEFAULT.to_string());

    for (person, org, position_type) in [
        (AUTHOR, ORG_EF1_1, PositionType::Regular),
        (S1_APPROVER, ORG_EF1, PositionType::Regular),
        (S2_APPROVER, ORG_EF1, PositionType::Superuser),
        (ADMIN, ORG_DEFAULT, PositionType::Administrator),
        (DEFAULT_APPROVER, ORG_DEFAULT, PositionType::Regular),
        (TASK_APPROVER_IN, ORG_EF1_1, PositionType::Regular),
        (TASK_APPROVER_OUT, ORG_EF2, PositionType::Regular),
        (EF2_AUTHOR, ORG_EF2, PositionType::Regular),
    ] {
        dir.insert_position(Position {
            id: position_of(person),
            name: format!("Position of {person}"),
            organization_id: Some(org),
            person_id: Some(person),
            position_type,
        });
    }

    let report = ApprovalStepType::ReportApproval;
    dir.insert_step(step(
        STEP_EF1_REVIEW,
        StepOwner::Organization(ORG_EF1),
        "EF 1 review",
        report,
        Some(STEP_EF1_SIGNOFF),
        &[S1_APPROVER],
    ));
    dir.insert_step(step(
        STEP_EF1_SIGNOFF,
        StepOwner::Organization(ORG_EF1),
        "EF 1 sign-off",
        report,
        None,
        &[S2_APPROVER],
    ));
    dir.insert_step(step(
        STEP_DEFAULT,
        StepOwner::Organization(ORG_DEFAULT),
        "Default review",
        report,
        None,
        &[DEFAULT_APPROVER],
    ));

    dir.insert_task(Task {
        id: TASK,
        short_name: "1.1.A".to_string(),
        tasked_organization_ids: vec![ORG_EF1],
    });
    dir.insert_location(Location {
        id: LOCATION,
        name: "Ministry of Defense".to_string(),
    });
    dir
}

/// Add the task's chain: an open step, then a restricted one, plus a
/// planning step.
pub fn add_task_steps(dir: &mut DirectorySnapshot, restricted_approvers: &[DbId]) {
    dir.insert_step(step(
        STEP_TASK_OPEN,
        StepOwner::Task(TASK),
        "Task owner review",
        ApprovalStepType::ReportApproval,
        Some(STEP_TASK_RESTRICTED),
        &[S1_APPROVER],
    ));
    let mut restricted = step(
        STEP_TASK_RESTRICTED,
        StepOwner::Task(TASK),
        "Tasked organization review",
        ApprovalStepType::ReportApproval,
        None,
        restricted_approvers,
    );
    restricted.restricted_approval = true;
    dir.insert_step(restricted);
    dir.insert_step(step(
        STEP_TASK_PLANNING,
        StepOwner::Task(TASK),
        "Task planning review",
        ApprovalStepType::PlanningApproval,
        None,
        &[S2_APPROVER],
    ));
}

pub fn add_location_step(dir: &mut DirectorySnapshot) {
    dir.insert_step(step(
        STEP_LOCATION,
        StepOwner::Location(LOCATION),
        "Site review",
        ApprovalStepType::ReportApproval,
        None,
        &[DEFAULT_APPROVER],
    ));
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
    rollups: Mutex<Vec<RollupEvent>>,
}

impl RecordingNotifier {
    pub fn take_notifications(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.notifications.lock().unwrap())
    }

    pub fn take_rollups(&self) -> Vec<RollupEvent> {
        std::mem::take(&mut *self.rollups.lock().unwrap())
    }
}

impl NotificationTrigger for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }
}

impl RollupSink for RecordingNotifier {
    fn record(&self, event: &RollupEvent) {
        self.rollups.lock().unwrap().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub type Engine = ReportEngine<InMemoryReportStore, InMemoryDirectory>;

pub struct Harness {
    pub engine: Arc<Engine>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new(directory: DirectorySnapshot) -> Self {
        Self::with_config(directory, WorkflowConfig::default())
    }

    pub fn with_config(directory: DirectorySnapshot, config: WorkflowConfig) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(FixedClock::new(now()));
        let engine = ReportEngine::new(
            InMemoryReportStore::new(),
            InMemoryDirectory::new(directory),
            &config,
        )
        .with_notifier(notifier.clone())
        .with_rollup_sink(notifier.clone())
        .with_clock(clock.clone());
        Self {
            engine: Arc::new(engine),
            notifier,
            clock,
        }
    }

    /// Change the live configuration.
    pub fn reconfigure(&self, change: impl FnOnce(&mut DirectorySnapshot)) {
        self.engine.directory().update(change).unwrap();
    }

    /// Create a report by `AUTHOR` about an engagement two days ago.
    pub async fn draft(&self, input: CreateReport) -> DbId {
        self.engine.create_report(AUTHOR, input).await.unwrap().report.id
    }
}

pub fn past_engagement() -> CreateReport {
    CreateReport {
        intent: "Discuss training schedule".to_string(),
        engagement_date: Some(now() - Duration::days(2)),
        primary_advisor_id: Some(AUTHOR),
        ..Default::default()
    }
}

pub fn planned_engagement() -> CreateReport {
    CreateReport {
        engagement_date: Some(now() + Duration::days(5)),
        ..past_engagement()
    }
}
