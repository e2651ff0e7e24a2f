//! The decision engine: prompt, call the backend, decode, retry.

use std::sync::Arc;
use std::time::Instant;

use backon::BlockingRetryable;

use crate::bibliography::PaperRecord;
use crate::config::RetryPolicy;
use crate::criteria::CriteriaSet;
use crate::error::{Result, ScreenError};
use crate::llm::prompts::screening_prompt;
use crate::llm::{LlmBackend, Prompt};

use super::decision::{Decision, Verdict};
use super::response::parse_response;

/// Turns a paper and a criteria set into a [`Decision`].
///
/// The engine never fails: when every attempt errors, the paper is recorded
/// as uncertain with the last error as reasoning.
#[derive(Clone)]
pub struct DecisionEngine {
    backend: Arc<dyn LlmBackend>,
    retry: RetryPolicy,
}

impl DecisionEngine {
    /// Create an engine that owns its backend.
    pub fn new(backend: impl LlmBackend + 'static, retry: RetryPolicy) -> Self {
        Self::with_backend(Arc::new(backend), retry)
    }

    /// Create an engine around a shared backend.
    pub fn with_backend(backend: Arc<dyn LlmBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub fn backend(&self) -> &dyn LlmBackend {
        self.backend.as_ref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Screen one paper.
    pub fn decide(&self, paper: &PaperRecord, criteria: &CriteriaSet) -> Decision {
        let prompt = screening_prompt(paper, criteria);
        let started = Instant::now();
        let mut attempts = 0usize;

        let outcome = (|| {
            attempts += 1;
            self.attempt(&prompt, criteria)
        })
        .retry(self.retry.backoff())
        .sleep(std::thread::sleep)
        .when(ScreenError::is_transient)
        .notify(|err: &ScreenError, delay| {
            tracing::debug!(
                citekey = %paper.citekey,
                "Attempt failed ({}), retrying in {:?}",
                err,
                delay
            );
        })
        .call();

        tracing::debug!(
            citekey = %paper.citekey,
            attempts,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend call finished"
        );

        match outcome {
            Ok(verdict) => Decision::from_verdict(paper, verdict),
            Err(e) => {
                tracing::warn!(citekey = %paper.citekey, "Screening failed: {}", e);
                Decision::failed(
                    paper,
                    format!("Screening failed after {} attempt(s): {}", attempts, e),
                )
            }
        }
    }

    fn attempt(&self, prompt: &Prompt, criteria: &CriteriaSet) -> Result<Verdict> {
        let text = self.backend.generate(prompt)?;
        parse_response(&text, criteria)
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("backend", &self.backend.name())
            .field("model", &self.backend.model())
            .field("retry", &self.retry)
            .finish()
    }
}
