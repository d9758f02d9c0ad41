//! Remove build output directories

use crate::error::{TaskError, TaskResult};
use crate::runner::Context;
use std::fs;
use std::io::ErrorKind;

pub fn run(ctx: &Context) -> TaskResult<()> {
    for dir in &ctx.config.clean {
        let path = ctx.resolve(dir);
        match fs::remove_dir_all(&path) {
            Ok(()) => ctx.reporter.debug(&format!("Removed {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(TaskError::io(path, e)),
        }
    }
    Ok(())
}
