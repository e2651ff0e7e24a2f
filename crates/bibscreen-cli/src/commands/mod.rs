//! CLI command implementations.

pub mod filter;
pub mod screen;
pub mod status;
