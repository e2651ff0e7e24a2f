//! Screening orchestration: one decision per paper, in input order.
//!
//! [`Screener::run`] drives the [`DecisionEngine`] over every paper, either
//! sequentially or on a bounded worker pool, and collects decisions by input
//! index so the report order never depends on completion order. Per-entry
//! failures are already folded into `uncertain` decisions by the engine, so a
//! run only fails on an interrupt.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::bibliography::{extract_records, PaperRecord};
use crate::config::ScreeningConfig;
use crate::criteria::CriteriaSet;
use crate::decision::{Decision, DecisionEngine, DecisionStatus};
use crate::error::{Result, ScreenError};
use crate::llm::LlmBackend;
use crate::report::{criteria_breakdown, save_report, write_report, ReportFormat, ReportRow, StatusCounts};

/// Characters of reasoning shown in progress logs.
const REASONING_PREVIEW: usize = 50;

/// Ordered decisions for one run, one per screened paper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningReport {
    decisions: Vec<Decision>,
}

impl ScreeningReport {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self { decisions }
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn get(&self, citekey: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.citekey() == citekey)
    }

    /// Decisions with `status`, in report order.
    pub fn with_status(&self, status: DecisionStatus) -> impl Iterator<Item = &Decision> {
        self.decisions.iter().filter(move |d| d.status() == status)
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_statuses(self.decisions.iter().map(Decision::status))
    }

    /// Citations per criterion id, sorted by id.
    pub fn criteria_counts(&self) -> BTreeMap<String, usize> {
        criteria_breakdown(self.decisions.iter().map(Decision::criteria))
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.decisions.iter().map(ReportRow::from).collect()
    }

    pub fn write<W: Write>(&self, writer: W, format: ReportFormat) -> Result<()> {
        write_report(writer, &self.rows(), format)
    }

    /// Save as CSV, or TSV for a `.tsv` path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        save_report(path, &self.rows(), ReportFormat::from_path(path))
    }
}

/// Side-channel information about a run. Not part of the report itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub backend: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    /// Papers screened.
    pub entries: usize,
    /// Bibliography blocks that could not be turned into papers.
    pub skipped_entries: usize,
    pub counts: StatusCounts,
    /// Citations per criterion id.
    pub criteria: BTreeMap<String, usize>,
    /// SHA-256 of the bibliography text, when screened from source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bibliography_sha256: Option<String>,
    /// SHA-256 of the criteria document, when screened from source text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_sha256: Option<String>,
}

impl RunSummary {
    /// Log final statistics at info level.
    pub fn log(&self) {
        tracing::info!(
            backend = %self.backend,
            model = %self.model,
            elapsed_secs = self.elapsed_secs,
            "Screening complete: {} entries",
            self.entries
        );
        for status in DecisionStatus::ALL {
            tracing::info!(
                "{}: {} ({:.1}%)",
                status.label(),
                self.counts.get(status),
                self.counts.percent(status)
            );
        }
        for (id, count) in &self.criteria {
            tracing::info!("Criterion {}: {}", id, count);
        }
        if self.skipped_entries > 0 {
            tracing::warn!("{} bibliography entries were skipped", self.skipped_entries);
        }
    }

    /// Write the summary as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
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
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// A finished run.
#[derive(Debug, Clone)]
pub struct ScreeningRun {
    pub report: ScreeningReport,
    pub summary: RunSummary,
}

/// Screens papers against a criteria set.
#[derive(Debug, Clone)]
pub struct Screener {
    engine: DecisionEngine,
    concurrency: usize,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Screener {
    /// A sequential screener.
    pub fn new(engine: DecisionEngine) -> Self {
        Self {
            engine,
            concurrency: 1,
            interrupt: None,
        }
    }

    /// Build the engine and screener from a run configuration.
    pub fn from_config(backend: Arc<dyn LlmBackend>, config: &ScreeningConfig) -> Self {
        Self::new(DecisionEngine::with_backend(backend, config.retry)).with_concurrency(config.concurrency)
    }

    /// Number of papers screened in parallel (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Stop starting new papers once `flag` is set.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Screen every paper exactly once.
    pub fn run(&self, papers: &[PaperRecord], criteria: &CriteriaSet) -> Result<ScreeningRun> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let total = papers.len();
        let done = AtomicUsize::new(0);

        tracing::info!(
            entries = total,
            criteria = criteria.len(),
            backend = %self.engine.backend().name(),
            model = %self.engine.backend().model(),
            concurrency = self.concurrency,
            "Starting screening"
        );

        let screen_one = |index: usize, paper: &PaperRecord| -> Option<Decision> {
            if self.interrupted() {
                return None;
            }
            tracing::info!(
                "Processing entry {}/{} ({:.1}%) - {}",
                index + 1,
                total,
                (index + 1) as f64 * 100.0 / total as f64,
                paper.citekey
            );
            let decision = self.engine.decide(paper, criteria);
            tracing::info!("Result: {}", result_line(&decision));
            done.fetch_add(1, Ordering::SeqCst);
            Some(decision)
        };

        let slots: Vec<Option<Decision>> = if self.concurrency <= 1 || total <= 1 {
            papers
                .iter()
                .enumerate()
                .map(|(i, paper)| screen_one(i, paper))
                .collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.concurrency)
                .build()
                .map_err(|e| ScreenError::Config(format!("failed to start worker pool: {}", e)))?;
            pool.install(|| {
                papers
                    .par_iter()
                    .enumerate()
                    .map(|(i, paper)| screen_one(i, paper))
                    .collect()
            })
        };

        let decisions: Vec<Decision> = slots.into_iter().flatten().collect();
        if decisions.len() < total {
            return Err(ScreenError::Interrupted {
                processed: done.load(Ordering::SeqCst),
                total,
            });
        }

        let report = ScreeningReport::new(decisions);
        let summary = RunSummary {
            backend: self.engine.backend().name().to_string(),
            model: self.engine.backend().model().to_string(),
            started_at,
            finished_at: Utc::now(),
            elapsed_secs: timer.elapsed().as_secs_f64(),
            entries: report.len(),
            skipped_entries: 0,
            counts: report.counts(),
            criteria: report.criteria_counts(),
            bibliography_sha256: None,
            criteria_sha256: None,
        };

        Ok(ScreeningRun { report, summary })
    }

    /// Screen raw bibliography text against a raw criteria document.
    ///
    /// The criteria are loaded first: an unusable criteria document fails the
    /// run before any backend call is made.
    pub fn screen_sources(&self, bibliography_text: &str, criteria_text: &str) -> Result<ScreeningRun> {
        let criteria = CriteriaSet::parse(criteria_text)?;
        let extraction = extract_records(bibliography_text);

        let mut run = self.run(&extraction.records, &criteria)?;
        run.summary.skipped_entries = extraction.issues.len();
        run.summary.bibliography_sha256 = Some(digest(bibliography_text));
        run.summary.criteria_sha256 = Some(digest(criteria_text));
        Ok(run)
    }
}

fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// `accepted (CI1;CI2) - reasoning preview`
fn result_line(decision: &Decision) -> String {
    format!(
        "{} ({}) - {}",
        decision.status().label(),
        decision.criteria().join(";"),
        preview(decision.reasoning())
    )
}

fn preview(reasoning: &str) -> String {
    let flat = reasoning.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > REASONING_PREVIEW {
        let cut: String = flat.chars().take(REASONING_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}
