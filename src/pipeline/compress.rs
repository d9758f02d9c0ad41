//! Package the project into a zip archive
//!
//! Text files get the package-name placeholder substituted on the way in.

use crate::error::{TaskError, TaskResult};
use crate::pipeline::{read_file, PathSet};
use crate::runner::Context;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Replace `token` with `name` when the bytes are valid UTF-8
pub fn replace_token(bytes: Vec<u8>, token: &str, name: &str) -> Vec<u8> {
    if token.is_empty() {
        return bytes;
    }
    match String::from_utf8(bytes) {
        Ok(text) if text.contains(token) => text.replace(token, name).into_bytes(),
        Ok(text) => text.into_bytes(),
        Err(e) => e.into_bytes(),
    }
}

/// Archive entry name: forward slashes regardless of platform
fn entry_name(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of the archive the compress task writes
pub fn archive_path(ctx: &Context) -> PathBuf {
    ctx.resolve(&ctx.config.paths.package.dest)
        .join(format!("{}.zip", ctx.package_name()))
}

pub fn run(ctx: &Context) -> TaskResult<()> {
    let set = PathSet::new(&ctx.config.paths.package.src)?;
    let name = ctx.package_name();
    let token = &ctx.config.package.token;
    let archive = archive_path(ctx);

    // Enumerate before creating the archive so it never packs itself
    let files: Vec<PathBuf> = set
        .files(&ctx.root)?
        .into_iter()
        .filter(|rel| ctx.resolve(rel) != archive)
        .collect();

    if let Some(parent) = archive.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    let file = File::create(&archive).map_err(|e| TaskError::io(&archive, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for rel in &files {
        let bytes = replace_token(read_file(&ctx.resolve(rel))?, token, &name);
        zip.start_file(entry_name(rel), options)?;
        zip.write_all(&bytes).map_err(|e| TaskError::io(&archive, e))?;
    }
    zip.finish()?;

    ctx.reporter.info(&format!(
        "Packaged {} file(s) into {}",
        files.len(),
        archive.display()
    ));
    Ok(())
}
