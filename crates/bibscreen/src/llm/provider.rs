//! Language-model backend trait and shared plumbing.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::error::{Result, ScreenError};

/// A request to a language model: one system message and one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Configuration for LLM backends.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Default configuration for a specific model.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

/// Trait for language-model backends.
///
/// The decision engine only needs a synchronous "generate text from prompt"
/// capability. Implementations must be thread-safe (Send + Sync) so one
/// backend can serve several screening workers.
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for the prompt.
    ///
    /// Errors should be [`ScreenError::Backend`], with `transient` set when
    /// retrying could help (network failures, rate limits, server errors).
    fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// Get the configuration for this backend.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this backend (for logging/debugging).
    fn name(&self) -> &str;

    /// The underlying model identifier.
    fn model(&self) -> &str {
        &self.config().model
    }
}

/// Build the blocking HTTP client shared by the remote backends.
pub(crate) fn http_client(config: &LlmConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ScreenError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Map a failed request (no HTTP response at all) to a backend error.
pub(crate) fn request_error(provider: &str, e: reqwest::Error) -> ScreenError {
    ScreenError::transient(format!("{} request failed: {}", provider, e))
}

/// Map a non-success HTTP status to a backend error.
///
/// Rate limits, timeouts and server errors are transient; anything else
/// (bad key, bad request, unknown model) is not.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> ScreenError {
    let message = format!("{} API error ({}): {}", provider, status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        ScreenError::transient(message)
    } else {
        ScreenError::permanent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_classification() {
        assert!(status_error("openai", StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(status_error("openai", StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(status_error("openai", StatusCode::REQUEST_TIMEOUT, "").is_transient());
        assert!(!status_error("openai", StatusCode::UNAUTHORIZED, "bad key").is_transient());
        assert!(!status_error("openai", StatusCode::NOT_FOUND, "").is_transient());
    }

    #[test]
    fn test_status_error_message() {
        let err = status_error("Anthropic", StatusCode::UNAUTHORIZED, " invalid x-api-key \n");
        assert_eq!(
            err.to_string(),
            "Backend error: Anthropic API error (401 Unauthorized): invalid x-api-key"
        );
    }

    #[test]
    fn test_default_config_is_deterministic() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.0);
    }
}
