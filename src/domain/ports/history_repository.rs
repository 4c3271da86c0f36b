use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{HistoryEntry, InspectionStatus, Verdict};

/// Filters for querying inspection history
#[derive(Default, Debug, Clone)]
pub struct HistoryFilter {
    pub status: Option<InspectionStatus>,
    pub verdict: Option<Verdict>,
    pub part_label: Option<String>,
    pub slot: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// Aggregate counts over the retained history
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistorySummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    /// Entries that record machinery failure rather than a part verdict
    pub pipeline_failures: u64,
    pub total_defects: u64,
}

/// Repository port for finalized inspection snapshots
///
/// Entries are immutable once appended. Listing is always ordered by
/// completion time, newest first, and never reflects in-flight
/// inspections.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append a finalized entry. Idempotent by id: appending an entry
    /// whose id is already present changes nothing.
    ///
    /// Returns true when the entry was stored, false when it was
    /// already present.
    async fn append(&self, entry: &HistoryEntry) -> DomainResult<bool>;

    /// Get an entry by inspection ID
    async fn get(&self, id: Uuid) -> DomainResult<Option<HistoryEntry>>;

    /// List entries matching the filter, ordered by completion time descending
    async fn list(&self, filter: &HistoryFilter) -> DomainResult<Vec<HistoryEntry>>;

    /// Count entries matching the filter
    async fn count(&self, filter: &HistoryFilter) -> DomainResult<i64>;

    /// Aggregate counts over every retained entry
    async fn summary(&self) -> DomainResult<HistorySummary>;

    /// Drop the oldest entries until at most `keep` remain.
    ///
    /// Returns how many entries were removed.
    async fn prune(&self, keep: usize) -> DomainResult<u64>;
}
