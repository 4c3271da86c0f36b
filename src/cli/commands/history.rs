//! Implementation of the `ferroscan history` command.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{HistoryEntry, InspectionStatus, Verdict};
use crate::domain::ports::{HistoryFilter, HistoryRepository};
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Filter by terminal status (completed, failed)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Filter by verdict (passed, failed, undetermined)
    #[arg(short, long)]
    pub verdict: Option<String>,

    /// Filter by slot
    #[arg(long)]
    pub slot: Option<String>,

    /// Filter by part label
    #[arg(short, long = "part")]
    pub part_label: Option<String>,

    /// Only entries completed at or after this time (RFC 3339)
    #[arg(long)]
    pub since: Option<DateTime<Utc>>,

    /// Maximum number of entries to display
    #[arg(short, long, default_value = "50")]
    pub limit: i64,
}

#[derive(Debug, serde::Serialize)]
pub struct HistoryOutput {
    pub entries: Vec<HistoryEntry>,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        if self.entries.is_empty() {
            return "No inspections recorded.".to_string();
        }
        let table = TableFormatter::new().format_history(&self.entries);
        format!("{table}\nShowing {} inspection(s)", self.entries.len())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.entries).unwrap_or_default()
    }
}

fn parse_filter(args: &HistoryArgs) -> Result<HistoryFilter> {
    let status = args
        .status
        .as_deref()
        .map(|s| {
            InspectionStatus::from_str(s)
                .ok_or_else(|| anyhow::anyhow!("Unknown status '{s}'. Expected one of: ready, processing, completed, failed"))
        })
        .transpose()?;
    let verdict = args
        .verdict
        .as_deref()
        .map(|v| {
            Verdict::from_str(v).ok_or_else(|| {
                anyhow::anyhow!("Unknown verdict '{v}'. Expected one of: passed, failed, undetermined")
            })
        })
        .transpose()?;

    Ok(HistoryFilter {
        status,
        verdict,
        part_label: args.part_label.clone(),
        slot: args.slot.clone(),
        since: args.since,
        limit: Some(args.limit.max(0)),
    })
}

pub async fn execute(args: HistoryArgs, json_mode: bool) -> Result<()> {
    let filter = parse_filter(&args)?;
    let config = ConfigLoader::load()?;
    let history = super::open_history(&config).await?;

    let entries = history
        .list(&filter)
        .await
        .context("Failed to list inspection history")?;

    output(&HistoryOutput { entries }, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> HistoryArgs {
        HistoryArgs {
            status: None,
            verdict: None,
            slot: None,
            part_label: None,
            since: None,
            limit: 50,
        }
    }

    #[test]
    fn test_parse_filter_accepts_known_values() {
        let mut args = base_args();
        args.status = Some("completed".to_string());
        args.verdict = Some("passed".to_string());

        let filter = parse_filter(&args).unwrap();
        assert_eq!(filter.status, Some(InspectionStatus::Completed));
        assert_eq!(filter.verdict, Some(Verdict::Passed));
        assert_eq!(filter.limit, Some(50));
    }

    #[test]
    fn test_parse_filter_rejects_unknown_verdict() {
        let mut args = base_args();
        args.verdict = Some("maybe".to_string());
        assert!(parse_filter(&args).is_err());
    }
}
