//! Durable event persistence.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every event to the `workflow_events` table. It runs as a
//! long-lived background task and stops when the bus is dropped.

use anet_core::types::DbId;
use anet_db::models::workflow_event::CreateWorkflowEvent;
use anet_db::repositories::WorkflowEventRepo;
use anet_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::WorkflowEvent;

pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<WorkflowEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to persist event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Write a single event.
    pub async fn persist(pool: &DbPool, event: &WorkflowEvent) -> Result<DbId, sqlx::Error> {
        WorkflowEventRepo::insert(
            pool,
            &CreateWorkflowEvent {
                event_type: &event.event_type,
                source_entity_type: event.source_entity_type.as_deref(),
                source_entity_id: event.source_entity_id,
                actor_person_id: event.actor_person_id,
                payload: &event.payload,
                created_at: event.timestamp,
            },
        )
        .await
    }
}
