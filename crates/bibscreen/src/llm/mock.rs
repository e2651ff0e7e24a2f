//! Mock LLM backend for testing and dry runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScreenError};

use super::provider::{LlmBackend, LlmConfig, Prompt};

/// First rendered criterion line in a screening prompt: `- CI1: ...`.
static FIRST_CRITERION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^- ([A-Za-z]{1,4}\d{1,3}):").unwrap());

/// What to do once the script and the rules have nothing to say.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fallback {
    /// Accept, citing the first criterion in the prompt.
    AcceptFirst,
    /// Fail every call.
    Fail { message: String, transient: bool },
}

/// Mock backend that returns predictable responses.
///
/// Responses are chosen in order from:
/// 1. the queued script ([`MockBackend::push_response`], [`MockBackend::push_error`]),
/// 2. the first rule whose needle occurs in the user prompt
///    ([`MockBackend::respond_to`]),
/// 3. the fallback (accept citing the first criterion, or fail).
pub struct MockBackend {
    config: LlmConfig,
    script: Mutex<VecDeque<Result<String>>>,
    rules: Vec<(String, String)>,
    fallback: Fallback,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            config: LlmConfig::for_model("mock"),
            script: Mutex::new(VecDeque::new()),
            rules: Vec::new(),
            fallback: Fallback::AcceptFirst,
            calls: AtomicUsize::new(0),
        }
    }

    /// A backend whose every call fails.
    pub fn failing(message: impl Into<String>, transient: bool) -> Self {
        Self {
            fallback: Fallback::Fail {
                message: message.into(),
                transient,
            },
            ..Self::new()
        }
    }

    /// Create with custom configuration.
    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer `response` whenever the user prompt contains `needle`.
    pub fn respond_to(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((needle.into(), response.into()));
        self
    }

    /// Queue a response for the next call.
    pub fn push_response(&self, response: impl Into<String>) -> &Self {
        self.queue(Ok(response.into()));
        self
    }

    /// Queue an error for the next call.
    pub fn push_error(&self, error: ScreenError) -> &Self {
        self.queue(Err(error));
        self
    }

    /// Number of `generate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn queue(&self, item: Result<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    fn next_scripted(&self) -> Option<Result<String>> {
        self.script.lock().ok().and_then(|mut script| script.pop_front())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmBackend for MockBackend {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(scripted) = self.next_scripted() {
            return scripted;
        }

        if let Some((_, response)) = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.user.contains(needle.as_str()))
        {
            return Ok(response.clone());
        }

        match &self.fallback {
            Fallback::AcceptFirst => Ok(match FIRST_CRITERION.captures(&prompt.user) {
                Some(caps) => format!(
                    "Status: accepted\nCriteria: {id}\nReasoning: Mock backend accepts every paper under {id}.",
                    id = &caps[1]
                ),
                None => "Status: uncertain\nCriteria: not-applicable\nReasoning: Mock backend found no criteria in the prompt.".to_string(),
            }),
            Fallback::Fail { message, transient } => Err(ScreenError::Backend {
                message: message.clone(),
                transient: *transient,
            }),
        }
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(user: &str) -> Prompt {
        Prompt::new("system", user)
    }

    #[test]
    fn test_default_accepts_first_criterion() {
        let backend = MockBackend::new();
        let response = backend
            .generate(&prompt("Inclusion criteria:\n- CI1: Uses LLMs\n- CI2: Other"))
            .unwrap();

        assert!(response.starts_with("Status: accepted\nCriteria: CI1\n"));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_script_then_rules_then_fallback() {
        let backend = MockBackend::new().respond_to("Title: B", "Status: rejected");
        backend
            .push_response("first")
            .push_error(ScreenError::transient("rate limited"));

        assert_eq!(backend.generate(&prompt("Title: B")).unwrap(), "first");
        assert!(backend.generate(&prompt("Title: B")).unwrap_err().is_transient());
        assert_eq!(backend.generate(&prompt("Title: B")).unwrap(), "Status: rejected");
        assert!(backend.generate(&prompt("Title: A")).unwrap().contains("uncertain"));
        assert_eq!(backend.calls(), 4);
    }

    #[test]
    fn test_failing_backend() {
        let backend = MockBackend::failing("401 Unauthorized", false);
        let err = backend.generate(&prompt("anything")).unwrap_err();

        assert!(!err.is_transient());
        assert_eq!(backend.name(), "mock");
        assert_eq!(backend.model(), "mock");
    }
}
