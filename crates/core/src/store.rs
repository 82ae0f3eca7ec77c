//! Persistence seams of the engine.
//!
//! Implemented in memory by `anet-engine` and on PostgreSQL by `anet-db`.

use async_trait::async_trait;

use crate::directory::DirectorySnapshot;
use crate::error::CoreError;
use crate::report::Report;
use crate::types::{DbId, Version};

/// A value together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: Version,
}

/// Storage of reports with optimistic concurrency.
///
/// A write succeeds only if the stored version still equals the version
/// the caller read; otherwise it fails with [`CoreError::Conflict`] and
/// nothing is written. State, stage sequence, stage pointer and action log
/// are written together.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Store a new report, assigning its id. The first version is 1.
    async fn insert(&self, report: Report) -> Result<Versioned<Report>, CoreError>;

    async fn find(&self, id: DbId) -> Result<Option<Versioned<Report>>, CoreError>;

    /// Replace the stored report, returning the new version.
    async fn update(&self, report: &Report, expected_version: Version) -> Result<Version, CoreError>;

    async fn delete(&self, id: DbId, expected_version: Version) -> Result<(), CoreError>;
}

/// Source of the approval configuration.
///
/// Every call returns a fresh, internally consistent snapshot.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn snapshot(&self) -> Result<DirectorySnapshot, CoreError>;
}
