//! Bibscreen: LLM-assisted screening of bibliography entries.
//!
//! Bibscreen screens the entries of a BibTeX bibliography against a
//! user-written inclusion/exclusion criteria document. Each entry gets
//! exactly one decision (accepted, rejected or uncertain) with the criteria
//! that drove it and a short justification. A report of those decisions can
//! then be used to cut the bibliography down to the accepted entries.
//!
//! # Core Principles
//!
//! - **One decision per entry**: backend failures become `uncertain`, never a dropped entry
//! - **Strict decoding**: a model response missing a field is retried, never defaulted
//! - **Non-destructive**: accepted entries are written back verbatim
//!
//! # Example
//!
//! ```
//! use bibscreen::{DecisionEngine, MockBackend, RetryPolicy, Screener};
//!
//! let screener = Screener::new(DecisionEngine::new(MockBackend::new(), RetryPolicy::none()));
//! let run = screener
//!     .screen_sources(
//!         "@article{a2023, title = {LLMs for review screening}}",
//!         "## Inclusion\n- CI1: Uses a language model",
//!     )
//!     .unwrap();
//!
//! assert_eq!(run.report.len(), 1);
//! assert!(run.report.decisions()[0].is_accepted());
//! ```

pub mod bibliography;
pub mod config;
pub mod criteria;
pub mod decision;
pub mod error;
pub mod filter;
pub mod llm;
pub mod report;
pub mod screening;

pub use bibliography::{extract_records, Bibliography, Extraction, PaperRecord};
pub use config::{RetryPolicy, ScreeningConfig};
pub use criteria::{CriteriaSet, Criterion, Polarity};
pub use decision::{parse_response, Decision, DecisionEngine, DecisionStatus, Verdict};
pub use error::{Result, ScreenError};
pub use filter::{filter_bibliography, filter_report, filter_text, FilterOutcome};
pub use llm::{
    AnthropicBackend, LlmBackend, LlmConfig, MockBackend, OllamaBackend, OpenAIBackend, Prompt,
};
pub use report::{load_report, read_report, save_report, write_report, ReportFormat, ReportRow, StatusCounts};
pub use screening::{RunSummary, Screener, ScreeningReport, ScreeningRun};
