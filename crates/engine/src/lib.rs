//! Report workflow service.
//!
//! - [`ReportEngine`]: the operations callers use, with optimistic
//!   concurrency and structured logging of every transition.
//! - [`WorkflowConfig`]: environment configuration.
//! - [`memory`]: in-process report store and directory.

pub mod clock;
pub mod config;
pub mod memory;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, WorkflowConfig};
pub use memory::{InMemoryDirectory, InMemoryReportStore};
pub use service::{ReportEngine, ReportView};
