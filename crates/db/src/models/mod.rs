//! Row structs and DTOs.
//!
//! Each submodule contains a `FromRow` struct matching the table and, where
//! the row maps onto a domain type, an `into_domain` conversion that rejects
//! stored values the domain cannot represent.

pub mod admin_setting;
pub mod approval_step;
pub mod location;
pub mod organization;
pub mod position;
pub mod report;
pub mod task;
pub mod workflow_event;
