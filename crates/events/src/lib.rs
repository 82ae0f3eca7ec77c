//! Workflow event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`WorkflowEvent`]: the event envelope.
//! - [`EventNotifier`]: turns engine notifications and rollup records into
//!   bus events.
//! - [`EventPersistence`]: background consumer writing every event to the
//!   `workflow_events` table.

pub mod bus;
pub mod notifier;
pub mod persistence;

pub use bus::{EventBus, WorkflowEvent};
pub use notifier::EventNotifier;
pub use persistence::EventPersistence;
