//! Table output formatting for CLI commands
//!
//! Formatted table output for inspection history using comfy-table.
//! Supports color-coded cells, automatic column sizing, and plain
//! icon fallbacks when colors are disabled.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{HistoryEntry, InspectionStatus, Verdict};
use crate::domain::ports::HistorySummary;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format recorded inspections as a table, one row per entry.
    pub fn format_history(&self, entries: &[HistoryEntry]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Slot").add_attribute(Attribute::Bold),
            Cell::new("Part").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Verdict").add_attribute(Attribute::Bold),
            Cell::new("Defects").add_attribute(Attribute::Bold),
            Cell::new("Completed").add_attribute(Attribute::Bold),
        ]);

        for entry in entries {
            let id = entry.id.to_string();
            let id_short = &id[..8];
            let part = entry.part_label.as_deref().unwrap_or("-");

            let status_cell = if self.use_colors {
                Cell::new(entry.status.as_str()).fg(status_color(entry.status))
            } else {
                Cell::new(format!("{} {}", status_icon(entry.status), entry.status.as_str()))
            };

            let verdict_text = entry.verdict.map_or("-", |v| v.as_str());
            let verdict_cell = match entry.verdict {
                Some(verdict) if self.use_colors => {
                    Cell::new(verdict_text).fg(verdict_color(verdict))
                }
                Some(verdict) => Cell::new(format!("{} {}", verdict_icon(verdict), verdict_text)),
                None => Cell::new(verdict_text),
            };

            table.add_row(vec![
                Cell::new(id_short),
                Cell::new(&entry.slot),
                Cell::new(truncate_text(part, 30)),
                status_cell,
                verdict_cell,
                Cell::new(entry.defect_count.to_string()),
                Cell::new(format_relative_time(&entry.completed_at)),
            ]);
        }

        table.to_string()
    }

    /// Format aggregate history counts as a metric table.
    pub fn format_summary(&self, summary: &HistorySummary) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Count").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec!["Total inspections", &summary.total.to_string()]);
        table.add_row(vec!["Passed", &summary.passed.to_string()]);
        table.add_row(vec!["Failed", &summary.failed.to_string()]);
        table.add_row(vec!["Pipeline failures", &summary.pipeline_failures.to_string()]);
        table.add_row(vec!["Total defects", &summary.total_defects.to_string()]);

        table.to_string()
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width as u16);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

fn status_color(status: InspectionStatus) -> Color {
    match status {
        InspectionStatus::Completed => Color::Green,
        InspectionStatus::Processing => Color::Cyan,
        InspectionStatus::Failed => Color::Red,
        InspectionStatus::Ready => Color::Yellow,
    }
}

fn status_icon(status: InspectionStatus) -> &'static str {
    match status {
        InspectionStatus::Completed => "✓",
        InspectionStatus::Processing => "⟳",
        InspectionStatus::Failed => "✗",
        InspectionStatus::Ready => "○",
    }
}

fn verdict_color(verdict: Verdict) -> Color {
    match verdict {
        Verdict::Passed => Color::Green,
        Verdict::Failed => Color::Red,
        Verdict::Undetermined => Color::Yellow,
    }
}

fn verdict_icon(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Passed => "✓",
        Verdict::Failed => "✗",
        Verdict::Undetermined => "?",
    }
}

/// Truncate text to max length with ellipsis
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Format relative time (e.g., "2 hours ago")
fn format_relative_time(datetime: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(*datetime);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        datetime.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Defect, Inspection, Measurement};

    fn sample_entry() -> HistoryEntry {
        let mut inspection = Inspection::new("station-1").with_part_label("Valve Body");
        inspection.transition_to(InspectionStatus::Processing).unwrap();
        inspection
            .complete(
                Verdict::Failed,
                Some(vec![Defect::new("scratch", 0.92, "(32, 16) 16x16")]),
                Some(Measurement::new(25.5, 12.5)),
            )
            .unwrap();
        HistoryEntry::from_inspection(&inspection).unwrap()
    }

    #[test]
    fn test_format_history() {
        let entry = sample_entry();

        let formatter = TableFormatter::with_config(false, None);
        let output = formatter.format_history(&[entry]);

        assert!(output.contains("station-1"));
        assert!(output.contains("Valve Body"));
        assert!(output.contains("failed"));
    }

    #[test]
    fn test_format_summary() {
        let summary = HistorySummary {
            total: 10,
            passed: 6,
            failed: 3,
            pipeline_failures: 1,
            total_defects: 7,
        };

        let formatter = TableFormatter::with_config(false, None);
        let output = formatter.format_summary(&summary);

        assert!(output.contains("Total inspections"));
        assert!(output.contains("10"));
        assert!(output.contains("Pipeline failures"));
    }

    #[test]
    fn test_status_icon_mapping() {
        assert_eq!(status_icon(InspectionStatus::Completed), "✓");
        assert_eq!(status_icon(InspectionStatus::Failed), "✗");
        assert_eq!(status_icon(InspectionStatus::Processing), "⟳");
        assert_eq!(status_icon(InspectionStatus::Ready), "○");
    }

    #[test]
    fn test_verdict_color_mapping() {
        assert_eq!(verdict_color(Verdict::Passed), Color::Green);
        assert_eq!(verdict_color(Verdict::Failed), Color::Red);
        assert_eq!(verdict_color(Verdict::Undetermined), Color::Yellow);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("this is a very long text", 10), "this is...");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn test_truncate_text_edge_cases() {
        assert_eq!(truncate_text("", 10), "");
        assert_eq!(truncate_text("abc", 3), "abc");
        assert_eq!(truncate_text("abcd", 3), "...");
    }
}
