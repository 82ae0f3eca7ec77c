use anet_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `admin_settings` table. A `NULL` value means unset.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminSettingRow {
    pub id: DbId,
    pub key: String,
    pub value: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
