use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::ArchiveSummary;
use crate::catalogue::ApiCategory;
use crate::error::Result;
use crate::ScanReport;

#[derive(Serialize)]
struct UsageRecord<'a> {
    category: ApiCategory,
    signature: &'a str,
    count: u64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    archive: &'a ArchiveSummary,
    catalogue_size: usize,
    total_hits: u64,
    usage: Vec<UsageRecord<'a>>,
}

/// Render a single-archive scan as a JSON report.
pub fn render(report: &ScanReport) -> Result<String> {
    let usage = report
        .table
        .observed(&report.catalogue)
        .map(|(entry, count)| UsageRecord {
            category: entry.category,
            signature: &entry.signature,
            count,
        })
        .collect();

    let json = JsonReport {
        generated_at: Utc::now(),
        archive: &report.archive,
        catalogue_size: report.catalogue.len(),
        total_hits: report.table.total(),
        usage,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}
