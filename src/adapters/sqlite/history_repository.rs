//! SQLite-backed inspection history.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Defect, HistoryEntry, InspectionFailure, InspectionStatus, Measurement, StageReport, Verdict,
};
use crate::domain::ports::{HistoryFilter, HistoryRepository, HistorySummary};

use super::{parse_datetime, parse_json, parse_optional_json, parse_uuid};

/// Durable history store over the `inspections` table.
///
/// Appends are idempotent on the inspection id, so replaying a
/// finalization after a crash cannot duplicate rows.
#[derive(Debug, Clone)]
pub struct SqliteHistoryRepository {
    pool: SqlitePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Build the `AND ...` tail and its bindings for a filter. The
    /// limit is handled by callers since count queries ignore it.
    fn filter_clause(filter: &HistoryFilter) -> (String, Vec<String>) {
        let mut clause = String::new();
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = filter.status {
            clause.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(verdict) = filter.verdict {
            clause.push_str(" AND verdict = ?");
            bindings.push(verdict.as_str().to_string());
        }
        if let Some(part_label) = &filter.part_label {
            clause.push_str(" AND part_label = ?");
            bindings.push(part_label.clone());
        }
        if let Some(slot) = &filter.slot {
            clause.push_str(" AND slot = ?");
            bindings.push(slot.clone());
        }
        if let Some(since) = filter.since {
            clause.push_str(" AND completed_at >= ?");
            bindings.push(since.to_rfc3339());
        }

        (clause, bindings)
    }
}

#[async_trait]
impl HistoryRepository for SqliteHistoryRepository {
    async fn append(&self, entry: &HistoryEntry) -> DomainResult<bool> {
        let defects_json = entry.defects.as_ref().map(serde_json::to_string).transpose()?;
        let measurement_json = entry.measurement.as_ref().map(serde_json::to_string).transpose()?;
        let stage_reports_json = serde_json::to_string(&entry.stage_reports)?;
        let failure_json = entry.failure.as_ref().map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO inspections (
                id, slot, part_label, status, verdict, defects, defect_count,
                measurement, stage_reports, failure, submitted_at, completed_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.slot)
        .bind(&entry.part_label)
        .bind(entry.status.as_str())
        .bind(entry.verdict.map(|v| v.as_str()))
        .bind(defects_json)
        .bind(i64::from(entry.defect_count))
        .bind(measurement_json)
        .bind(stage_reports_json)
        .bind(failure_json)
        .bind(entry.submitted_at.to_rfc3339())
        .bind(entry.completed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<HistoryEntry>> {
        let row: Option<InspectionRow> = sqlx::query_as("SELECT * FROM inspections WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(HistoryEntry::try_from).transpose()
    }

    async fn list(&self, filter: &HistoryFilter) -> DomainResult<Vec<HistoryEntry>> {
        let (clause, bindings) = Self::filter_clause(filter);
        let mut sql =
            format!("SELECT * FROM inspections WHERE 1=1{clause} ORDER BY completed_at DESC");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, InspectionRow>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(HistoryEntry::try_from).collect()
    }

    async fn count(&self, filter: &HistoryFilter) -> DomainResult<i64> {
        let (clause, bindings) = Self::filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM inspections WHERE 1=1{clause}");

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        for binding in &bindings {
            query = query.bind(binding);
        }

        let (count,) = query.fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn summary(&self) -> DomainResult<HistorySummary> {
        let row: (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN verdict = 'passed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN verdict = 'failed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(defect_count), 0)
            FROM inspections
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(HistorySummary {
            total: row.0 as u64,
            passed: row.1 as u64,
            failed: row.2 as u64,
            pipeline_failures: row.3 as u64,
            total_defects: row.4 as u64,
        })
    }

    async fn prune(&self, keep: usize) -> DomainResult<u64> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        let result = sqlx::query(
            r#"
            DELETE FROM inspections WHERE id NOT IN (
                SELECT id FROM inspections ORDER BY completed_at DESC LIMIT ?
            )
            "#,
        )
        .bind(keep)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Raw row shape. Everything is TEXT or INTEGER in SQLite; parsing
/// into domain types happens in the TryFrom below.
#[derive(Debug, sqlx::FromRow)]
struct InspectionRow {
    id: String,
    slot: String,
    part_label: Option<String>,
    status: String,
    verdict: Option<String>,
    defects: Option<String>,
    defect_count: i64,
    measurement: Option<String>,
    stage_reports: String,
    failure: Option<String>,
    submitted_at: String,
    completed_at: String,
}

impl TryFrom<InspectionRow> for HistoryEntry {
    type Error = DomainError;

    fn try_from(row: InspectionRow) -> Result<Self, Self::Error> {
        let status = InspectionStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Unknown inspection status: {}", row.status))
        })?;
        let verdict = row
            .verdict
            .as_deref()
            .map(|v| {
                Verdict::from_str(v).ok_or_else(|| {
                    DomainError::SerializationError(format!("Unknown verdict: {v}"))
                })
            })
            .transpose()?;
        let defects: Option<Vec<Defect>> = parse_optional_json(row.defects)?;
        let measurement: Option<Measurement> = parse_optional_json(row.measurement)?;
        let stage_reports: Vec<StageReport> = parse_json(&row.stage_reports)?;
        let failure: Option<InspectionFailure> = parse_optional_json(row.failure)?;

        Ok(HistoryEntry {
            id: parse_uuid(&row.id)?,
            slot: row.slot,
            part_label: row.part_label,
            status,
            verdict,
            defects,
            defect_count: row.defect_count.max(0) as u32,
            measurement,
            stage_reports,
            failure,
            submitted_at: parse_datetime(&row.submitted_at)?,
            completed_at: parse_datetime(&row.completed_at)?,
        })
    }
}
