//! Asset tasks
//!
//! Each task is a thin pass over one asset class: enumerate its source set,
//! hand the bytes to the library that owns the transformation, and write
//! the result below the destination.

pub mod clean;
pub mod compress;
pub mod copy;
pub mod html;
pub mod images;
pub mod paths;
pub mod scripts;
pub mod styles;

pub use paths::PathSet;

use crate::config::AssetPaths;
use crate::error::{TaskError, TaskResult};
use crate::runner::Context;
use rayon::prelude::*;
use std::fs;
use std::path::Path;

/// Write a file, creating parent directories as needed
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> TaskResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| TaskError::io(path, e))
}

pub(crate) fn read_file(path: &Path) -> TaskResult<Vec<u8>> {
    fs::read(path).map_err(|e| TaskError::io(path, e))
}

/// Pass every file of an asset set through `transform` into its destination
///
/// Files are processed on the rayon pool. Returns the number of files written.
pub(crate) fn process_set<F>(ctx: &Context, paths: &AssetPaths, transform: F) -> TaskResult<usize>
where
    F: Fn(&Path, Vec<u8>) -> TaskResult<Vec<u8>> + Sync,
{
    let set = PathSet::new(&paths.src)?;
    let dest = ctx.resolve(&paths.dest);
    let files = set.files(&ctx.root)?;

    files.par_iter().try_for_each(|rel| {
        let source = ctx.resolve(rel);
        let output = transform(&source, read_file(&source)?)?;
        let target = set.destination(rel, &dest);
        tracing::debug!(source = %rel.display(), target = %target.display(), "writing asset");
        write_file(&target, &output)
    })?;

    Ok(files.len())
}
