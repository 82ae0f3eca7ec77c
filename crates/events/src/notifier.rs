//! Bridges the engine's outward calls onto the [`EventBus`].

use std::sync::Arc;

use anet_core::notification::{Notification, NotificationTrigger, RollupEvent, RollupSink};

use crate::bus::{EventBus, WorkflowEvent};

pub const EVENT_APPROVAL_NEEDED: &str = "report.approval_needed";
pub const EVENT_REPORT_REJECTED: &str = "report.rejected";
pub const EVENT_REPORT_EDITED: &str = "report.edited";
pub const EVENT_REPORT_PUBLISHED: &str = "report.published";
pub const EVENT_REPORT_UNPUBLISHED: &str = "report.unpublished";

/// Source entity type of every event this notifier publishes.
pub const SOURCE_REPORT: &str = "report";

/// Publishes notifications and rollup records as [`WorkflowEvent`]s.
///
/// The payload is the serialized notification, so consumers see the same
/// fields the engine produced.
#[derive(Clone)]
pub struct EventNotifier {
    bus: Arc<EventBus>,
}

impl EventNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    fn publish(&self, event: WorkflowEvent, payload: Result<serde_json::Value, serde_json::Error>) {
        match payload {
            Ok(payload) => self.bus.publish(event.with_payload(payload)),
            Err(e) => tracing::error!(
                error = %e,
                event_type = %event.event_type,
                "Failed to serialize event payload"
            ),
        }
    }
}

impl NotificationTrigger for EventNotifier {
    fn notify(&self, notification: &Notification) {
        let event = match notification {
            Notification::ApprovalNeeded { .. } => WorkflowEvent::new(EVENT_APPROVAL_NEEDED),
            Notification::ReportRejected { rejected_by, .. } => {
                WorkflowEvent::new(EVENT_REPORT_REJECTED).with_actor(*rejected_by)
            }
            Notification::ReportEdited { editor, .. } => {
                WorkflowEvent::new(EVENT_REPORT_EDITED).with_actor(*editor)
            }
        }
        .with_source(SOURCE_REPORT, notification.report_id());

        self.publish(event, serde_json::to_value(notification));
    }
}

impl RollupSink for EventNotifier {
    fn record(&self, event: &RollupEvent) {
        let (event_type, report_id, at) = match event {
            RollupEvent::Published { report_id, at, .. } => (EVENT_REPORT_PUBLISHED, *report_id, *at),
            RollupEvent::Unpublished { report_id, at, .. } => {
                (EVENT_REPORT_UNPUBLISHED, *report_id, *at)
            }
        };
        let envelope = WorkflowEvent::new(event_type)
            .with_source(SOURCE_REPORT, report_id)
            .at(at);
        self.publish(envelope, serde_json::to_value(event));
    }
}
