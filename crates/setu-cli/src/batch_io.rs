//! Batch request files and report output.
//!
//! Request files are CSV with the headers `source_system`, `source_code` and
//! `target_system`. Reports are written as CSV (one row per request, top
//! candidate only) or as a JSON document with full results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use setu_map::{BatchItem, BatchReport, BatchRequest, BatchSummary, MappingStatistics};
use setu_model::MappingResult;
use tracing::debug;

/// Read batch requests, skipping rows with a blank source code.
pub fn read_requests(path: &Path) -> Result<Vec<BatchRequest>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_requests_from(file).with_context(|| format!("read {}", path.display()))
}

pub fn read_requests_from<R: io::Read>(reader: R) -> Result<Vec<BatchRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut requests = Vec::new();
    for (line, row) in reader.deserialize::<BatchRequest>().enumerate() {
        let request = row.with_context(|| format!("request row {}", line + 1))?;
        if request.source_code.is_empty() {
            debug!(row = line + 1, "blank source code skipped");
            continue;
        }
        requests.push(request);
    }
    Ok(requests)
}

/// Flat CSV row describing one batch outcome.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    source_system: &'a str,
    source_code: &'a str,
    target_system: &'a str,
    outcome: &'static str,
    target_code: Option<&'a str>,
    target_display: Option<&'a str>,
    confidence: Option<String>,
    relation: Option<&'static str>,
    candidates: usize,
    index_version: Option<u64>,
    error: Option<String>,
}

impl<'a> ReportRow<'a> {
    fn new(request: &'a BatchRequest, item: &'a BatchItem) -> Self {
        let mut row = Self {
            source_system: &request.source_system,
            source_code: &request.source_code,
            target_system: &request.target_system,
            outcome: outcome(item),
            target_code: None,
            target_display: None,
            confidence: None,
            relation: None,
            candidates: 0,
            index_version: None,
            error: None,
        };
        match item {
            BatchItem::Resolved(result) => {
                row.candidates = result.candidates.len();
                row.index_version = Some(result.index_version);
                if let Some(top) = result.top() {
                    row.target_code = Some(top.target.code.as_str());
                    row.target_display = Some(&top.target.display);
                    row.confidence = Some(format!("{:.4}", top.confidence));
                    row.relation = Some(top.relation.as_str());
                }
            }
            BatchItem::Failed(err) => row.error = Some(err.to_string()),
            BatchItem::Cancelled => {}
        }
        row
    }
}

/// Status of a resolved item, or the failure/cancellation marker.
pub fn outcome(item: &BatchItem) -> &'static str {
    match item {
        BatchItem::Resolved(result) => result.status.as_str(),
        BatchItem::Failed(err) => err.kind(),
        BatchItem::Cancelled => "CANCELLED",
    }
}

/// Write one CSV row per request, in request order.
pub fn write_report_csv<W: Write>(
    writer: W,
    requests: &[BatchRequest],
    report: &BatchReport,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for (request, item) in requests.iter().zip(&report.items) {
        writer
            .serialize(ReportRow::new(request, item))
            .context("write report row")?;
    }
    writer.flush().context("flush report")?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ItemDocument<'a> {
    request: &'a BatchRequest,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a MappingResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

/// JSON form of a batch report.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    summary: BatchSummary,
    statistics: MappingStatistics,
    items: Vec<ItemDocument<'a>>,
}

impl<'a> ReportDocument<'a> {
    pub fn new(requests: &'a [BatchRequest], report: &'a BatchReport) -> Self {
        let items = requests
            .iter()
            .zip(&report.items)
            .map(|(request, item)| ItemDocument {
                request,
                outcome: outcome(item),
                result: item.result(),
                error: item.error().map(ToString::to_string),
                retryable: item.error().is_some_and(setu_map::ResolveError::is_retryable),
            })
            .collect();
        Self {
            summary: report.summary,
            statistics: MappingStatistics::from_results(report.results()),
            items,
        }
    }
}

pub fn write_report_json<W: Write>(
    writer: W,
    requests: &[BatchRequest],
    report: &BatchReport,
) -> Result<()> {
    serde_json::to_writer_pretty(writer, &ReportDocument::new(requests, report))
        .context("write JSON report")
}
