//! Per-paper screening decisions.
//!
//! [`DecisionEngine::decide`] builds the prompt for one paper, asks the
//! backend, decodes the response with [`parse_response`] and retries
//! transient failures under a [`RetryPolicy`](crate::RetryPolicy).

#[allow(clippy::module_inception)]
mod decision;
mod engine;
mod response;

pub use decision::{Decision, DecisionStatus, Verdict};
pub use engine::DecisionEngine;
pub use response::parse_response;
