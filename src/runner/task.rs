//! Built-in task names and dispatch

use crate::error::{ConfigError, TaskResult};
use crate::pipeline;
use crate::runner::Context;
use crate::serve;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// The closed set of built-in tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskName {
    Clean,
    Html,
    Styles,
    Images,
    Copy,
    Scripts,
    Compress,
    Watch,
    Reload,
}

impl TaskName {
    pub const ALL: [TaskName; 9] = [
        TaskName::Clean,
        TaskName::Html,
        TaskName::Styles,
        TaskName::Images,
        TaskName::Copy,
        TaskName::Scripts,
        TaskName::Compress,
        TaskName::Watch,
        TaskName::Reload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::Clean => "clean",
            TaskName::Html => "html",
            TaskName::Styles => "styles",
            TaskName::Images => "images",
            TaskName::Copy => "copy",
            TaskName::Scripts => "scripts",
            TaskName::Compress => "compress",
            TaskName::Watch => "watch",
            TaskName::Reload => "reload",
        }
    }

    /// One-line description for help text
    pub fn about(self) -> &'static str {
        match self {
            TaskName::Clean => "Delete the output directory",
            TaskName::Html => "Copy HTML, minified in production",
            TaskName::Styles => "Compile Sass; minify in production, inline source maps otherwise",
            TaskName::Images => "Copy images, optimized in production",
            TaskName::Copy => "Copy the remaining static assets",
            TaskName::Scripts => "Bundle JavaScript with the configured bundler",
            TaskName::Compress => "Zip the project into packaged/<name>.zip",
            TaskName::Watch => "Serve with live reload and rebuild on change",
            TaskName::Reload => "Tell connected browsers to refresh",
        }
    }

    /// Run this task against the context
    pub fn run(self, ctx: &Context) -> TaskResult<()> {
        match self {
            TaskName::Clean => pipeline::clean::run(ctx),
            TaskName::Html => pipeline::html::run(ctx),
            TaskName::Styles => pipeline::styles::run(ctx),
            TaskName::Images => pipeline::images::run(ctx),
            TaskName::Copy => pipeline::copy::run(ctx),
            TaskName::Scripts => pipeline::scripts::run(ctx),
            TaskName::Compress => pipeline::compress::run(ctx),
            TaskName::Watch => serve::watch::run(ctx),
            TaskName::Reload => serve::reload(ctx),
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::TaskNotFound(s.to_string()))
    }
}

/// Run a task with start/finish reporting
pub fn run_task(name: TaskName, ctx: &Context) -> TaskResult<()> {
    ctx.reporter.task_start(name.as_str());
    let started = Instant::now();

    let result = name.run(ctx);

    match &result {
        Ok(()) => ctx.reporter.task_finish(name.as_str(), started.elapsed()),
        Err(e) => {
            tracing::debug!(task = %name, error = ?e, "task failed");
            ctx.reporter.task_failed(name.as_str(), e);
        }
    }

    result
}
