//! Error types for the bibscreen library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for screening operations.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed source text for a single unit (entry, criterion, report row).
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Unusable configuration or criteria document.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure talking to the language-model backend.
    #[error("Backend error: {message}")]
    Backend { message: String, transient: bool },

    /// Backend response that could not be decoded into a decision.
    #[error("Invalid model response: {0}")]
    Validation(String),

    /// Report row whose citekey does not exist in the bibliography.
    #[error("Report citekey '{citekey}' not found in bibliography")]
    Join { citekey: String },

    /// The run was stopped by a process interrupt.
    #[error("Screening interrupted after {processed} of {total} entries")]
    Interrupted { processed: usize, total: usize },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScreenError {
    /// Backend failure that is worth retrying (network, rate limit, 5xx).
    pub fn transient(message: impl Into<String>) -> Self {
        ScreenError::Backend {
            message: message.into(),
            transient: true,
        }
    }

    /// Backend failure that will not go away by retrying (auth, bad request).
    pub fn permanent(message: impl Into<String>) -> Self {
        ScreenError::Backend {
            message: message.into(),
            transient: false,
        }
    }

    /// Whether the decision engine should retry after this error.
    ///
    /// Malformed responses are retried too: the backend may well produce a
    /// well-formed answer on the next attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ScreenError::Backend { transient, .. } => *transient,
            ScreenError::Validation(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for screening operations.
pub type Result<T> = std::result::Result<T, ScreenError>;
