//! Rassets - a YAML-configured front-end asset pipeline
//!
//! Rassets compiles Sass, minifies HTML, bundles JavaScript through an
//! external bundler, optimizes images, serves the output with live reload
//! and packages the result, driven by a `rassets.yml` file.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod serve;
pub mod ui;

// Re-export commonly used types
pub use error::{RassetsError, Result};

/// Current version of Rassets
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
