//! Domain logic of the report approval workflow.
//!
//! Everything here is pure and synchronous apart from the storage traits in
//! [`store`]. Operations evaluate against a [`directory::DirectorySnapshot`]
//! taken for the duration of one request.

pub mod approval_step;
pub mod authorizer;
pub mod directory;
pub mod error;
pub mod model;
pub mod notification;
pub mod org_chain;
pub mod report;
pub mod roles;
pub mod settings;
pub mod state_machine;
pub mod store;
pub mod task_filter;
pub mod types;
pub mod workflow;
