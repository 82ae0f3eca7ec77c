//! Repository for the `workflow_events` table.

use anet_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::workflow_event::{CreateWorkflowEvent, WorkflowEventRow};

const COLUMNS: &str = "id, event_type, source_entity_type, source_entity_id, actor_person_id, \
    payload, created_at";

pub struct WorkflowEventRepo;

impl WorkflowEventRepo {
    /// Insert an event, returning the generated ID.
    pub async fn insert<'e, E>(
        executor: E,
        input: &CreateWorkflowEvent<'_>,
    ) -> Result<DbId, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "INSERT INTO workflow_events
                (event_type, source_entity_type, source_entity_id, actor_person_id, payload, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(input.event_type)
        .bind(input.source_entity_type)
        .bind(input.source_entity_id)
        .bind(input.actor_person_id)
        .bind(input.payload)
        .bind(input.created_at)
        .fetch_one(executor)
        .await
    }

    /// Events about one entity, oldest first.
    pub async fn list_for_source<'e, E>(
        executor: E,
        source_entity_type: &str,
        source_entity_id: DbId,
    ) -> Result<Vec<WorkflowEventRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM workflow_events
             WHERE source_entity_type = $1 AND source_entity_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, WorkflowEventRow>(&query)
            .bind(source_entity_type)
            .bind(source_entity_id)
            .fetch_all(executor)
            .await
    }
}
