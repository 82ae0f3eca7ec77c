//! Conversion of database failures into [`CoreError`].

use anet_core::error::CoreError;

/// PostgreSQL `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// PostgreSQL `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// Classify a sqlx error.
///
/// Constraint races and serialization failures are conflicts the caller can
/// retry after reloading. A dangling reference in the caller's input is a
/// validation failure. Everything else is logged and reported as internal.
pub fn into_core(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return CoreError::Validation(format!(
                    "Referenced entity does not exist ({constraint})"
                ));
            }
            Some(SERIALIZATION_FAILURE) => {
                return CoreError::Conflict(
                    "Concurrent update detected; reload and retry".to_string(),
                );
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(err.to_string())
}

/// A stored value that does not parse into its domain type.
pub(crate) fn corrupt(table: &str, id: impl std::fmt::Display, reason: String) -> CoreError {
    tracing::error!(table, id = %id, reason = %reason, "Invalid stored value");
    CoreError::Internal(format!("Invalid row {id} in {table}: {reason}"))
}
