//! Heuristic architecture-flow diagrams from any source tree.
//!
//! [`core::FlowEngine`] scans a directory, extracts functions with
//! line-oriented dialect patterns, resolves calls by name, and renders the
//! most significant functions as a layered Mermaid flowchart.
//! [`core::Engine`] adds configuration loading and optional generative
//! augmentation with a deterministic fallback.

pub mod config;
pub mod core;
pub mod error;

pub use config::Config;
pub use error::{ArchflowError, Result};
