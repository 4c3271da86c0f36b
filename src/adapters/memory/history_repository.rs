//! In-memory history repository.
//!
//! Keeps finalized inspections for the lifetime of the process. The
//! default store for embedded use and tests; the sqlite adapter provides
//! durability across runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{HistoryEntry, Verdict};
use crate::domain::ports::{HistoryFilter, HistoryRepository, HistorySummary};

/// History store backed by a map under an async lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryRepository {
    entries: Arc<RwLock<HashMap<Uuid, HistoryEntry>>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(entry: &HistoryEntry, filter: &HistoryFilter) -> bool {
        if filter.status.is_some_and(|status| entry.status != status) {
            return false;
        }
        if filter
            .verdict
            .is_some_and(|verdict| entry.verdict != Some(verdict))
        {
            return false;
        }
        if let Some(part_label) = &filter.part_label {
            if entry.part_label.as_deref() != Some(part_label.as_str()) {
                return false;
            }
        }
        if let Some(slot) = &filter.slot {
            if entry.slot != *slot {
                return false;
            }
        }
        if filter.since.is_some_and(|since| entry.completed_at < since) {
            return false;
        }
        true
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, entry: &HistoryEntry) -> DomainResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&entry.id) {
            return Ok(false);
        }
        entries.insert(entry.id, entry.clone());
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<HistoryEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&id).cloned())
    }

    async fn list(&self, filter: &HistoryFilter) -> DomainResult<Vec<HistoryEntry>> {
        let entries = self.entries.read().await;
        let mut matching: Vec<HistoryEntry> = entries
            .values()
            .filter(|entry| Self::matches(entry, filter))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        if let Some(limit) = filter.limit {
            matching.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(matching)
    }

    async fn count(&self, filter: &HistoryFilter) -> DomainResult<i64> {
        let entries = self.entries.read().await;
        let count = entries
            .values()
            .filter(|entry| Self::matches(entry, filter))
            .count();
        Ok(count as i64)
    }

    async fn summary(&self) -> DomainResult<HistorySummary> {
        let entries = self.entries.read().await;
        let mut summary = HistorySummary {
            total: 0,
            passed: 0,
            failed: 0,
            pipeline_failures: 0,
            total_defects: 0,
        };
        for entry in entries.values() {
            summary.total += 1;
            match entry.verdict {
                Some(Verdict::Passed) => summary.passed += 1,
                Some(Verdict::Failed) => summary.failed += 1,
                Some(Verdict::Undetermined) | None => {}
            }
            if entry.is_pipeline_failure() {
                summary.pipeline_failures += 1;
            }
            summary.total_defects += u64::from(entry.defect_count);
        }
        Ok(summary)
    }

    async fn prune(&self, keep: usize) -> DomainResult<u64> {
        let mut entries = self.entries.write().await;
        if entries.len() <= keep {
            return Ok(0);
        }

        let mut ordered: Vec<(Uuid, DateTime<Utc>)> = entries
            .iter()
            .map(|(id, entry)| (*id, entry.completed_at))
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        let removed = ordered.split_off(keep);
        for (id, _) in &removed {
            entries.remove(id);
        }
        Ok(removed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Inspection, InspectionStatus};
    use chrono::Duration;

    fn entry_completed_at(offset_secs: i64) -> HistoryEntry {
        let mut inspection = Inspection::new("station-1");
        inspection
            .transition_to(InspectionStatus::Processing)
            .unwrap();
        inspection
            .complete(Verdict::Passed, Some(vec![]), None)
            .unwrap();
        let mut entry = HistoryEntry::from_inspection(&inspection).unwrap();
        entry.completed_at = Utc::now() + Duration::seconds(offset_secs);
        entry
    }

    #[tokio::test]
    async fn test_append_is_idempotent_by_id() {
        let repo = InMemoryHistoryRepository::new();
        let entry = entry_completed_at(0);

        assert!(repo.append(&entry).await.unwrap());
        assert!(!repo.append(&entry).await.unwrap());
        assert_eq!(repo.count(&HistoryFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_prune_keeps_newest_entries() {
        let repo = InMemoryHistoryRepository::new();
        let oldest = entry_completed_at(-30);
        let middle = entry_completed_at(-20);
        let newest = entry_completed_at(-10);
        for entry in [&oldest, &middle, &newest] {
            repo.append(entry).await.unwrap();
        }

        let removed = repo.prune(2).await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.get(oldest.id).await.unwrap().is_none());
        assert!(repo.get(middle.id).await.unwrap().is_some());
        assert!(repo.get(newest.id).await.unwrap().is_some());
    }
}
