//! Filtering a bibliography down to the accepted entries of a report.

use std::collections::{HashMap, HashSet};

use crate::bibliography::Bibliography;
use crate::decision::DecisionStatus;
use crate::error::ScreenError;
use crate::report::{ReportRead, ReportRow};

/// Result of a filter pass.
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// The filtered bibliography text.
    pub text: String,
    /// Citekeys written to `text`, in bibliography order.
    pub kept: Vec<String>,
    /// Report rows whose citekey is not in the bibliography.
    pub join_errors: Vec<ScreenError>,
    /// Non-fatal problems with the inputs (duplicate rows, malformed entries).
    pub issues: Vec<ScreenError>,
}

/// Keep the bibliography entries whose citekey is `accepted` in the report.
///
/// Entries are written verbatim and in bibliography order, after any
/// `@string`/`@preamble` directives. Report rows that do not match an entry
/// are reported as [`ScreenError::Join`] and otherwise ignored.
pub fn filter_bibliography(rows: &[ReportRow], bibliography: &Bibliography) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    let mut statuses: HashMap<&str, DecisionStatus> = HashMap::with_capacity(rows.len());
    for row in rows {
        if statuses.contains_key(row.citekey.as_str()) {
            outcome.issues.push(ScreenError::Parse {
                line: 0,
                message: format!(
                    "duplicate report row for '{}', keeping first occurrence",
                    row.citekey
                ),
            });
            continue;
        }
        statuses.insert(row.citekey.as_str(), row.status);
    }

    let known: HashSet<&str> = bibliography
        .entries
        .iter()
        .map(|e| e.citekey.as_str())
        .collect();
    let mut reported = HashSet::new();
    for row in rows {
        if !known.contains(row.citekey.as_str()) && reported.insert(row.citekey.as_str()) {
            outcome.join_errors.push(ScreenError::Join {
                citekey: row.citekey.clone(),
            });
        }
    }

    let mut blocks: Vec<&str> = bibliography.directives.iter().map(|d| d.trim()).collect();
    for entry in &bibliography.entries {
        if statuses.get(entry.citekey.as_str()) == Some(&DecisionStatus::Accepted) {
            blocks.push(entry.source.trim());
            outcome.kept.push(entry.citekey.clone());
        }
    }

    if !outcome.kept.is_empty() {
        outcome.text = blocks.join("\n\n");
        outcome.text.push('\n');
    }

    for err in &outcome.join_errors {
        tracing::warn!("{}", err);
    }
    for issue in &outcome.issues {
        tracing::warn!("{}", issue);
    }
    tracing::debug!(
        kept = outcome.kept.len(),
        entries = bibliography.entries.len(),
        "Filtered bibliography"
    );

    outcome
}

/// Parse bibliography text and filter it. Parse issues are included in the
/// outcome's `issues`.
pub fn filter_text(rows: &[ReportRow], bibliography_text: &str) -> FilterOutcome {
    filter_source(rows, &[], bibliography_text)
}

/// Filter with a report as read from disk. Rows skipped for an unreadable
/// status keep nothing but are still checked against the bibliography.
pub fn filter_report(report: &ReportRead, bibliography_text: &str) -> FilterOutcome {
    filter_source(&report.rows, &report.unreadable, bibliography_text)
}

fn filter_source(
    rows: &[ReportRow],
    unreadable: &[String],
    bibliography_text: &str,
) -> FilterOutcome {
    let bibliography = Bibliography::parse(bibliography_text);
    let mut outcome = filter_bibliography(rows, &bibliography);

    let mut reported: HashSet<String> = outcome
        .join_errors
        .iter()
        .filter_map(|e| match e {
            ScreenError::Join { citekey } => Some(citekey.clone()),
            _ => None,
        })
        .collect();
    for citekey in unreadable {
        if bibliography.get(citekey).is_none() && reported.insert(citekey.clone()) {
            let err = ScreenError::Join {
                citekey: citekey.clone(),
            };
            tracing::warn!("{}", err);
            outcome.join_errors.push(err);
        }
    }

    let mut issues = bibliography.issues;
    issues.append(&mut outcome.issues);
    outcome.issues = issues;
    outcome
}
