//! Tabular screening reports (CSV/TSV).
//!
//! Every report has exactly the columns `citekey, title, status, criteria,
//! reasoning`. Reports double as the join input for the bibliography filter,
//! so the reader is tolerant of older files (legacy `not-sure` status,
//! comma-separated criteria) while the writer always emits the current form.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::decision::{Decision, DecisionStatus};
use crate::error::{Result, ScreenError};

/// Report columns, in order.
pub const REPORT_COLUMNS: [&str; 5] = ["citekey", "title", "status", "criteria", "reasoning"];

/// Separator for multiple criteria in one cell.
const CRITERIA_SEPARATOR: &str = ";";

/// On-disk report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ReportFormat {
    /// Pick the format from a file extension (`.tsv`/`.tab` → TSV, else CSV).
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("tab") => ReportFormat::Tsv,
            _ => ReportFormat::Csv,
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            ReportFormat::Csv => b',',
            ReportFormat::Tsv => b'\t',
        }
    }
}

/// One report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub citekey: String,
    pub title: String,
    pub status: DecisionStatus,
    pub criteria: Vec<String>,
    pub reasoning: String,
}

impl ReportRow {
    pub fn new(citekey: impl Into<String>, status: DecisionStatus) -> Self {
        Self {
            citekey: citekey.into(),
            title: String::new(),
            status,
            criteria: Vec::new(),
            reasoning: String::new(),
        }
    }
}

impl From<&Decision> for ReportRow {
    fn from(decision: &Decision) -> Self {
        Self {
            citekey: decision.citekey().to_string(),
            title: decision.title().to_string(),
            status: decision.status(),
            criteria: decision.criteria().to_vec(),
            reasoning: decision.reasoning().to_string(),
        }
    }
}

/// Rows read from a report, plus the rows that had to be skipped.
#[derive(Debug, Default)]
pub struct ReportRead {
    pub rows: Vec<ReportRow>,
    pub issues: Vec<ScreenError>,
    /// Citekeys of rows skipped because their status could not be read.
    pub unreadable: Vec<String>,
}

/// Per-status totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub accepted: usize,
    pub rejected: usize,
    pub uncertain: usize,
}

impl StatusCounts {
    pub fn from_statuses(statuses: impl IntoIterator<Item = DecisionStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.add(status);
        }
        counts
    }

    pub fn add(&mut self, status: DecisionStatus) {
        match status {
            DecisionStatus::Accepted => self.accepted += 1,
            DecisionStatus::Rejected => self.rejected += 1,
            DecisionStatus::Uncertain => self.uncertain += 1,
        }
    }

    pub fn get(&self, status: DecisionStatus) -> usize {
        match status {
            DecisionStatus::Accepted => self.accepted,
            DecisionStatus::Rejected => self.rejected,
            DecisionStatus::Uncertain => self.uncertain,
        }
    }

    pub fn total(&self) -> usize {
        self.accepted + self.rejected + self.uncertain
    }

    /// Share of `status` in percent (0.0 for an empty report).
    pub fn percent(&self, status: DecisionStatus) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.get(status) as f64 * 100.0 / total as f64,
        }
    }
}

/// How often each criterion was cited, sorted by id.
pub fn criteria_breakdown<'a>(
    criteria: impl IntoIterator<Item = &'a [String]>,
) -> BTreeMap<String, usize> {
    let mut breakdown = BTreeMap::new();
    for ids in criteria {
        for id in ids {
            *breakdown.entry(id.clone()).or_insert(0) += 1;
        }
    }
    breakdown
}

/// Write rows with the header to any writer.
pub fn write_report<W: Write>(writer: W, rows: &[ReportRow], format: ReportFormat) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .from_writer(writer);

    writer.write_record(REPORT_COLUMNS)?;
    for row in rows {
        writer.write_record([
            row.citekey.as_str(),
            row.title.as_str(),
            row.status.as_str(),
            row.criteria.join(CRITERIA_SEPARATOR).as_str(),
            row.reasoning.as_str(),
        ])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write rows to a file, creating parent directories as needed.
pub fn save_report(path: impl AsRef<Path>, rows: &[ReportRow], format: ReportFormat) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| ScreenError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let file = File::create(path).map_err(|e| ScreenError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_report(BufWriter::new(file), rows, format)
}

/// Read a report. Columns are located by header name, so extra or
/// reordered columns are fine; `citekey` and `status` are required.
pub fn read_report<R: Read>(reader: R, format: ReportFormat) -> Result<ReportRead> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };

    let missing = |name: &str| ScreenError::Parse {
        line: 1,
        message: format!("report has no '{}' column", name),
    };
    let citekey_col = column("citekey").ok_or_else(|| missing("citekey"))?;
    let status_col = column("status").ok_or_else(|| missing("status"))?;
    let title_col = column("title");
    let criteria_col = column("criteria");
    let reasoning_col = column("reasoning");

    let mut read = ReportRead::default();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or_default();
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or_default();

        let citekey = cell(Some(citekey_col)).trim();
        if citekey.is_empty() {
            read.issues.push(ScreenError::Parse {
                line,
                message: "report row has an empty citekey".to_string(),
            });
            continue;
        }

        let raw_status = cell(Some(status_col));
        let status = match raw_status.parse::<DecisionStatus>() {
            Ok(status) => status,
            Err(e) => {
                read.issues.push(ScreenError::Parse {
                    line,
                    message: format!("{} for '{}'", e, citekey),
                });
                read.unreadable.push(citekey.to_string());
                continue;
            }
        };

        read.rows.push(ReportRow {
            citekey: citekey.to_string(),
            title: cell(title_col).to_string(),
            status,
            criteria: split_criteria(cell(criteria_col)),
            reasoning: cell(reasoning_col).to_string(),
        });
    }

    for issue in &read.issues {
        tracing::warn!("Skipping report row: {}", issue);
    }

    Ok(read)
}

/// Read a report file; the format follows the file extension.
pub fn load_report(path: impl AsRef<Path>) -> Result<ReportRead> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ScreenError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    read_report(BufReader::new(file), ReportFormat::from_path(path))
}

fn split_criteria(cell: &str) -> Vec<String> {
    cell.split([';', ','])
        .map(str::trim)
        .filter(|id| {
            !id.is_empty() && !id.eq_ignore_ascii_case("not-applicable") && !id.eq_ignore_ascii_case("n/a")
        })
        .map(str::to_string)
        .collect()
}
