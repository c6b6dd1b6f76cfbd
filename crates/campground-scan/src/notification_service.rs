use std::fmt::Write as _;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, stdout};
use tracing::debug;

use crate::aggregator::AggregatedSnapshot;
use crate::classifier::Tier;
use crate::differ::CampgroundChanges;
use crate::executor::{AvailabilityReporter, PollReport};
use crate::scan_types::ScanError;

/// Renders change events, one line per event
pub fn render_changes(changes: &[CampgroundChanges]) -> String {
    let mut text = String::new();
    for campground in changes {
        for event in &campground.events {
            let _ = writeln!(text, "{}", event);
        }
    }
    text
}

/// Renders a snapshot grouped by tier, then by campground
pub fn render_snapshot(snapshot: &AggregatedSnapshot) -> String {
    let mut text = String::new();
    for tier in Tier::ALL {
        for (campground_id, tiers) in snapshot.iter() {
            let _ = writeln!(text, "🏕 {}", campground_id);
            let _ = writeln!(text, "  **{} Results:**", tier.heading());
            if let Some(counts) = tiers.get(&tier) {
                for (key, count) in counts {
                    let _ = writeln!(text, "  {} --> {} site(s) available", key, count);
                }
            }
        }
    }
    text
}

/// Full text of one poll report
pub fn render_report(report: &PollReport) -> String {
    let mut text = format!(
        "\n[{}] Poll #{}\n",
        report.checked_at.format("%Y-%m-%d %H:%M:%S"),
        report.poll_number
    );
    if report.has_changes() {
        text.push_str("\n=== Changes Detected ===\n");
        text.push_str(&render_changes(&report.changes));
    }
    text.push_str("\n=== Full Results for Reference ===\n");
    text.push_str(&render_snapshot(&report.snapshot));
    text
}

/// Prints reports to standard output
pub struct ConsoleReporter;

impl ConsoleReporter {
    async fn print(&self, text: &str) -> Result<(), ScanError> {
        let mut out = stdout();
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl AvailabilityReporter for ConsoleReporter {
    async fn report_poll(&self, report: &PollReport) -> Result<(), ScanError> {
        debug!("Printing report for poll #{}", report.poll_number);
        self.print(&render_report(report)).await
    }

    async fn report_failure(
        &self,
        error: &ScanError,
        retaining_previous: bool,
    ) -> Result<(), ScanError> {
        let mut text = format!("Error: {}\n", error);
        if retaining_previous {
            text.push_str("Skipping this check. Retaining previous results for future comparisons.\n");
        }
        self.print(&text).await
    }
}
