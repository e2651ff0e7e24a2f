//! OpenAI chat completions backend.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, ScreenError};

use super::provider::{http_client, request_error, status_error, LlmBackend, LlmConfig, Prompt};

/// OpenAI API endpoint.
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Model used when `OPENAI_MODEL` is not set.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// OpenAI GPT backend.
pub struct OpenAIBackend {
    client: Client,
    api_key: SecretString,
    api_url: String,
    config: LlmConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::for_model(DEFAULT_OPENAI_MODEL))
    }

    /// Create a new OpenAI backend with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let api_key: String = api_key.into();
        Ok(Self {
            client: http_client(&config)?,
            api_key: SecretString::from(api_key),
            api_url: API_URL.to_string(),
            config,
        })
    }

    /// Create from `OPENAI_API_KEY`, with the model from `OPENAI_MODEL`
    /// unless `model` overrides it.
    pub fn from_env(model: Option<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ScreenError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        let model = model
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        Self::with_config(api_key, LlmConfig::for_model(model))
    }

    /// Point the backend at an OpenAI-compatible endpoint.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
                .map_err(|e| ScreenError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }
}

impl LlmBackend for OpenAIBackend {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
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
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| request_error("OpenAI", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(status_error("OpenAI", status, &error_text));
        }

        let api_response: OpenAIResponse = response.json().map_err(|e| {
            ScreenError::transient(format!("Failed to parse OpenAI response: {}", e))
        })?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ScreenError::transient("No response content from OpenAI"))
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// OpenAI API response structure.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserialization() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Status: accepted"}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Status: accepted")
        );
    }

    #[test]
    fn test_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_backend_identity() {
        let backend = OpenAIBackend::new("sk-test").unwrap();
        assert_eq!(backend.name(), "openai");
        assert_eq!(backend.model(), DEFAULT_OPENAI_MODEL);
        assert!(backend.build_headers().is_ok());
    }
}
