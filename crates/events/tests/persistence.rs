//! Events published on the bus end up in `workflow_events`.

use std::sync::Arc;

use anet_core::notification::{Notification, NotificationTrigger};
use anet_db::repositories::WorkflowEventRepo;
use anet_events::notifier::{EVENT_REPORT_EDITED, SOURCE_REPORT};
use anet_events::{EventBus, EventNotifier, EventPersistence};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notifications_are_persisted_until_bus_closes(pool: PgPool) {
    let bus = Arc::new(EventBus::default());
    let worker = tokio::spawn(EventPersistence::run(pool.clone(), bus.subscribe()));

    let notifier = EventNotifier::new(bus.clone());
    notifier.notify(&Notification::ReportEdited {
        report_id: 12,
        editor: 101,
        recipients: vec![100],
    });

    drop(notifier);
    drop(bus);
    worker.await.unwrap();

    let rows = WorkflowEventRepo::list_for_source(&pool, SOURCE_REPORT, 12)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, EVENT_REPORT_EDITED);
    assert_eq!(rows[0].actor_person_id, Some(101));
    assert_eq!(rows[0].payload["kind"], "report_edited");
}
