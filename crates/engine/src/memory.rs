//! In-process implementations of the storage seams.
//!
//! Each write happens inside one critical section, which gives the same
//! all-or-nothing, version-checked behavior as the PostgreSQL store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use anet_core::directory::DirectorySnapshot;
use anet_core::error::CoreError;
use anet_core::report::Report;
use anet_core::store::{DirectorySource, ReportStore, Versioned};
use anet_core::types::{DbId, Version};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ReportTable {
    last_id: DbId,
    rows: HashMap<DbId, Versioned<Report>>,
}

#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    table: Mutex<ReportTable>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, ReportTable>, CoreError> {
        self.table
            .lock()
            .map_err(|_| CoreError::Internal("report store lock poisoned".into()))
    }
}

fn stale(id: DbId, expected: Version, actual: Version) -> CoreError {
    CoreError::Conflict(format!(
        "Report {id} was modified concurrently (expected version {expected}, found {actual})"
    ))
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert(&self, mut report: Report) -> Result<Versioned<Report>, CoreError> {
        let mut table = self.table()?;
        table.last_id += 1;
        report.id = table.last_id;
        let row = Versioned {
            value: report,
            version: 1,
        };
        table.rows.insert(row.value.id, row.clone());
        Ok(row)
    }

    async fn find(&self, id: DbId) -> Result<Option<Versioned<Report>>, CoreError> {
        Ok(self.table()?.rows.get(&id).cloned())
    }

    async fn update(&self, report: &Report, expected_version: Version) -> Result<Version, CoreError> {
        let mut table = self.table()?;
        let row = table.rows.get_mut(&report.id).ok_or(CoreError::NotFound {
            entity: "Report",
            id: report.id,
        })?;
        if row.version != expected_version {
            return Err(stale(report.id, expected_version, row.version));
        }
        row.value = report.clone();
        row.version += 1;
        Ok(row.version)
    }

    async fn delete(&self, id: DbId, expected_version: Version) -> Result<(), CoreError> {
        let mut table = self.table()?;
        let version = table
            .rows
            .get(&id)
            .map(|row| row.version)
            .ok_or(CoreError::NotFound {
                entity: "Report",
                id,
            })?;
        if version != expected_version {
            return Err(stale(id, expected_version, version));
        }
        table.rows.remove(&id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Approval configuration held in memory. Every snapshot is a clone, so
/// later changes never leak into an evaluation already running.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    current: RwLock<DirectorySnapshot>,
}

impl InMemoryDirectory {
    pub fn new(initial: DirectorySnapshot) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Change the configuration in place.
    pub fn update<R>(&self, change: impl FnOnce(&mut DirectorySnapshot) -> R) -> Result<R, CoreError> {
        let mut guard = self
            .current
            .write()
            .map_err(|_| CoreError::Internal("directory lock poisoned".into()))?;
        Ok(change(&mut guard))
    }
}

#[async_trait]
impl DirectorySource for InMemoryDirectory {
    async fn snapshot(&self) -> Result<DirectorySnapshot, CoreError> {
        self.current
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| CoreError::Internal("directory lock poisoned".into()))
    }
}
