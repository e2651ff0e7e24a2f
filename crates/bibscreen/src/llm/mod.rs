//! Language-model backends for the decision engine.
//!
//! The engine talks to a model only through [`LlmBackend::generate`], so any
//! backend (or a substitute in tests) can be injected at construction.
//!
//! # Supported Backends
//!
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`, model from `OPENAI_MODEL`)
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **Ollama** - Local models, no API key needed (requires Ollama running)
//! - **Mock** - Scripted, in-process responses
//!
//! # Example
//!
//! ```no_run
//! use bibscreen::{DecisionEngine, OpenAIBackend, RetryPolicy};
//!
//! let backend = OpenAIBackend::from_env(None).unwrap();
//! let engine = DecisionEngine::new(backend, RetryPolicy::default());
//! ```

mod anthropic;
mod mock;
mod ollama;
mod openai;
pub mod prompts;
mod provider;

pub use anthropic::{AnthropicBackend, DEFAULT_ANTHROPIC_MODEL};
pub use mock::MockBackend;
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_MODEL};
pub use openai::{OpenAIBackend, DEFAULT_OPENAI_MODEL};
pub use provider::{LlmBackend, LlmConfig, Prompt};
