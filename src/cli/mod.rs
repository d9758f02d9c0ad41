//! CLI interface and argument parsing
//!
//! This module builds the command line from the built-in tasks and the
//! configured pipelines, and generates shell completions.

pub mod app;

// Re-export main types
pub use app::*;
