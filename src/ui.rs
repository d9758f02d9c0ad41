//! Terminal reporting
//!
//! Status lines go to stderr so task output (bundler logs, completions)
//! keeps stdout to itself.

use colored::Colorize;
use std::time::Duration;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    #[default]
    Normal = 2,
    Verbose = 3,
}

/// Prints task progress at the configured verbosity
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbosity: Verbosity,
}

impl Reporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Reporter { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[rassets]".cyan(), message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[rassets]".red(), message.red());
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[rassets]".dimmed(), message.dimmed());
        }
    }

    pub fn task_start(&self, task: &str) {
        self.info(&format!("Starting '{}'...", task.cyan()));
    }

    pub fn task_finish(&self, task: &str, elapsed: Duration) {
        self.info(&format!(
            "Finished '{}' after {}",
            task.cyan(),
            format_duration(elapsed).magenta()
        ));
    }

    pub fn task_failed(&self, task: &str, error: &dyn std::fmt::Display) {
        self.error(&format!("'{}' errored: {}", task, error));
    }

    /// Name of the env filter to fall back to when `RASSETS_LOG` is unset
    pub fn default_log_filter(&self) -> &'static str {
        match self.verbosity {
            Verbosity::Verbose => "rassets=debug",
            Verbosity::Silent => "off",
            _ => "warn",
        }
    }
}

/// Milliseconds below a second, seconds with two decimals above
pub fn format_duration(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        format!("{} ms", ms)
    } else {
        format!("{:.2} s", elapsed.as_secs_f64())
    }
}
