//! Repository for the `admin_settings` table.

use sqlx::{PgExecutor, PgPool};

use crate::models::admin_setting::AdminSettingRow;

const COLUMNS: &str = "id, key, value, created_at, updated_at";

pub struct AdminSettingRepo;

impl AdminSettingRepo {
    pub async fn find_by_key<'e, E>(
        executor: E,
        key: &str,
    ) -> Result<Option<AdminSettingRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM admin_settings WHERE key = $1");
        sqlx::query_as::<_, AdminSettingRow>(&query)
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_all<'e, E>(executor: E) -> Result<Vec<AdminSettingRow>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM admin_settings ORDER BY key");
        sqlx::query_as::<_, AdminSettingRow>(&query)
            .fetch_all(executor)
            .await
    }

    /// Create or overwrite a setting. `None` clears the value.
    ///
    /// Values are stored as given; they are checked where they are used.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: Option<&str>,
    ) -> Result<AdminSettingRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO admin_settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AdminSettingRow>(&query)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await
    }
}
