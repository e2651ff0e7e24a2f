//! Ollama local LLM backend.
//!
//! Ollama allows running LLMs locally without API keys.
//! Install from: https://ollama.ai

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::error::{Result, ScreenError};

use super::provider::{http_client, status_error, LlmBackend, LlmConfig, Prompt};

/// Default Ollama API endpoint.
const DEFAULT_API_URL: &str = "http://localhost:11434/api/chat";

/// Model used when `OLLAMA_MODEL` is not set.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Ollama local LLM backend.
pub struct OllamaBackend {
    client: Client,
    api_url: String,
    config: LlmConfig,
}

impl OllamaBackend {
    /// Create a new Ollama backend with default settings.
    ///
    /// Uses llama3.2 model by default. Make sure you've pulled it:
    /// `ollama pull llama3.2`
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_OLLAMA_MODEL)
    }

    /// Create with a specific model.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        let config = LlmConfig {
            // Local models can be slower
            timeout: Duration::from_secs(120),
            ..LlmConfig::for_model(model)
        };
        Self::with_config(config)
    }

    /// Create with custom configuration. Honors `OLLAMA_HOST`.
    pub fn with_config(config: LlmConfig) -> Result<Self> {
        let api_url = std::env::var("OLLAMA_HOST")
            .map(|host| format!("{}/api/chat", host.trim_end_matches('/')))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            client: http_client(&config)?,
            api_url,
            config,
        })
    }

    /// Create with the model from `OLLAMA_MODEL` unless `model` overrides it.
    pub fn from_env(model: Option<String>) -> Result<Self> {
        let model = model
            .or_else(|| std::env::var("OLLAMA_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
        Self::with_model(model)
    }
}

impl LlmBackend for OllamaBackend {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            },
            "messages": [
                {
                    "role": "system",
                    "content": prompt.system
                },
                {
                    "role": "user",
                    "content": prompt.user
                }
            ]
        });

        let response = self
            .client
            .post(&self.api_url)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ScreenError::transient(
                        "Failed to connect to Ollama. Is it running? Start with: ollama serve",
                    )
                } else {
                    ScreenError::transient(format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();

            // Check for model not found error
            if error_text.contains("not found") {
                return Err(ScreenError::permanent(format!(
                    "Model '{}' not found. Pull it with: ollama pull {}",
                    self.config.model, self.config.model
                )));
            }

            return Err(status_error("Ollama", status, &error_text));
        }

        let api_response: OllamaResponse = response.json().map_err(|e| {
            ScreenError::transient(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(api_response.message.content)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama API response structure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model() {
        let backend = OllamaBackend::with_model("mistral").unwrap();
        assert_eq!(backend.model(), "mistral");
        assert_eq!(backend.config().timeout, Duration::from_secs(120));
        assert!(backend.api_url.ends_with("/api/chat"));
    }
}
