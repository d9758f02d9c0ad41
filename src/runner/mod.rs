//! Task execution engine
//!
//! This module holds the build context, external command execution and the
//! orchestrator that runs task plans in series or in parallel.

pub mod command;
pub mod context;
pub mod interpolate;
pub mod plan;
pub mod task;

// Re-export main types
pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use plan::*;
pub use task::*;
