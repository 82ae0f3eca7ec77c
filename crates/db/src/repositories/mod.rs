//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods. Reads are
//! generic over [`sqlx::PgExecutor`] so they run either on the pool or inside
//! a caller's transaction; multi-statement writes take the transaction.

pub mod admin_setting_repo;
pub mod approval_step_repo;
pub mod location_repo;
pub mod organization_repo;
pub mod position_repo;
pub mod report_repo;
pub mod task_repo;
pub mod workflow_event_repo;

pub use admin_setting_repo::AdminSettingRepo;
pub use approval_step_repo::ApprovalStepRepo;
pub use location_repo::LocationRepo;
pub use organization_repo::OrganizationRepo;
pub use position_repo::PositionRepo;
pub use report_repo::ReportRepo;
pub use task_repo::TaskRepo;
pub use workflow_event_repo::WorkflowEventRepo;
