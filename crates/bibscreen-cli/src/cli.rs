//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bibscreen: LLM-assisted screening of bibliography entries
#[derive(Parser)]
#[command(name = "bibscreen")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Screen every bibliography entry against a criteria document
    Screen {
        /// Bibliography to screen (BibTeX)
        #[arg(short, long, value_name = "BIB", default_value = "input.bib")]
        input: PathBuf,

        /// Inclusion/exclusion criteria document
        #[arg(short, long, value_name = "FILE", default_value = "criteria.md")]
        criteria: PathBuf,

        /// Report to write (CSV, or TSV for a .tsv path)
        #[arg(short, long, value_name = "FILE", default_value = "results.csv")]
        output: PathBuf,

        /// LLM provider to use
        #[arg(long, default_value = "openai")]
        llm: LlmProviderChoice,

        /// Model to use (provider-specific, e.g., "gpt-4o-mini", "llama3.2")
        #[arg(long)]
        model: Option<String>,

        /// Number of entries screened in parallel
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Attempts per entry before recording it as uncertain
        #[arg(long, default_value = "3")]
        max_attempts: usize,

        /// Also write a JSON run summary to this path
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },

    /// Write the accepted entries of a report to a new bibliography
    Filter {
        /// Original bibliography
        #[arg(short, long, value_name = "BIB", default_value = "input.bib")]
        input: PathBuf,

        /// Screening report
        #[arg(short, long, value_name = "FILE", default_value = "results.csv")]
        results: PathBuf,

        /// Filtered bibliography to write
        #[arg(short, long, value_name = "BIB", default_value = "accepted.bib")]
        output: PathBuf,
    },

    /// Show decision counts and criteria breakdown of a report
    Status {
        /// Screening report
        #[arg(short, long, value_name = "FILE", default_value = "results.csv")]
        results: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// LLM provider choice for screening
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LlmProviderChoice {
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    #[default]
    OpenAI,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Anthropic,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Mock provider for dry runs
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: openai, anthropic, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}
