//! Anthropic Claude messages backend.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ScreenError};

use super::provider::{http_client, request_error, status_error, LlmBackend, LlmConfig, Prompt};

/// Anthropic API endpoint.
const API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version.
const API_VERSION: &str = "2023-06-01";

/// Model used when `ANTHROPIC_MODEL` is not set.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Claude backend.
pub struct AnthropicBackend {
    client: Client,
    api_key: SecretString,
    config: LlmConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::for_model(DEFAULT_ANTHROPIC_MODEL))
    }

    /// Create a new Anthropic backend with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let api_key: String = api_key.into();
        Ok(Self {
            client: http_client(&config)?,
            api_key: SecretString::from(api_key),
            config,
        })
    }

    /// Create from `ANTHROPIC_API_KEY`, with the model from `ANTHROPIC_MODEL`
    /// unless `model` overrides it.
    pub fn from_env(model: Option<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ScreenError::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        let model = model
            .or_else(|| std::env::var("ANTHROPIC_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string());
        Self::with_config(api_key, LlmConfig::for_model(model))
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key.expose_secret())
                .map_err(|e| ScreenError::Config(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

impl LlmBackend for AnthropicBackend {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": prompt.system,
            "messages": [
                {
                    "role": "user",
                    "content": prompt.user
                }
            ]
        });

        let response = self
            .client
            .post(API_URL)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| request_error("Anthropic", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(status_error("Anthropic", status, &error_text));
        }

        let api_response: ApiResponse = response.json().map_err(|e| {
            ScreenError::transient(format!("Failed to parse Anthropic response: {}", e))
        })?;

        // Extract text from response
        api_response
            .content
            .into_iter()
            .find_map(|block| {
                if block.content_type == "text" {
                    block.text
                } else {
                    None
                }
            })
            .ok_or_else(|| ScreenError::transient("No text in Anthropic response"))
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Anthropic API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_skips_non_text_blocks() {
        let body = r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Status: rejected"}]}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        let text = parsed
            .content
            .into_iter()
            .find_map(|b| if b.content_type == "text" { b.text } else { None });
        assert_eq!(text.as_deref(), Some("Status: rejected"));
    }

    #[test]
    fn test_backend_identity() {
        let backend = AnthropicBackend::new("key").unwrap();
        assert_eq!(backend.name(), "anthropic");
        assert_eq!(backend.model(), DEFAULT_ANTHROPIC_MODEL);
    }
}
