//! External command execution
//!
//! Bundling is delegated to whatever tool the project configures; this
//! module runs its command template through the interpreter.

use crate::error::{TaskError, TaskResult};
use crate::runner::{interpolate_strict, Context};
use crate::ui::Verbosity;
use std::collections::HashMap;
use std::process::{Command as StdCommand, Stdio};

/// Interpolate a command template and run it from the project root
///
/// Every `${name}` must resolve; a misspelt variable never reaches the shell.
pub fn run_command(
    template: &str,
    vars: &HashMap<String, String>,
    ctx: &Context,
) -> TaskResult<()> {
    let exec_str = interpolate_strict(template, vars)?;

    ctx.reporter.debug(&format!("$ {}", exec_str));
    tracing::debug!(command = %exec_str, "running external command");

    let (program, args) = ctx
        .interpreter
        .split_first()
        .ok_or(TaskError::CommandFailed(None))?;

    let mut command = StdCommand::new(program);
    command.args(args);
    command.arg(&exec_str);
    command.current_dir(&ctx.root);
    command.stdin(Stdio::null());

    if ctx.reporter.verbosity() == Verbosity::Silent {
        command.stdout(Stdio::null());
        command.stderr(Stdio::null());
    } else {
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
    }

    for (key, value) in vars {
        command.env(format!("RASSETS_{}", key.to_uppercase()), value);
    }

    let status = command
        .status()
        .map_err(|e| TaskError::io(program.as_str(), e))?;

    if !status.success() {
        return Err(TaskError::CommandFailed(status.code()));
    }

    Ok(())
}
