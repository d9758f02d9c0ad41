//! JavaScript bundling through the configured bundler command

use crate::error::{TaskError, TaskResult};
use crate::pipeline::PathSet;
use crate::runner::{run_command, Context};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Variables a bundler command template may reference
pub const BUNDLE_VARS: [&str; 7] = ["entry", "outfile", "outdir", "flags", "name", "mode", "root"];

/// Template variables for one entry point
pub fn bundle_vars(ctx: &Context, entry: &Path, outfile: &Path) -> HashMap<String, String> {
    let scripts = &ctx.config.scripts;
    let flags = if ctx.is_production() {
        &scripts.production_flags
    } else {
        &scripts.development_flags
    };

    let mut vars = ctx.vars();
    vars.insert("entry".to_string(), entry.display().to_string());
    vars.insert("outfile".to_string(), outfile.display().to_string());
    vars.insert(
        "outdir".to_string(),
        outfile
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    );
    vars.insert("flags".to_string(), flags.clone());
    vars
}

pub fn run(ctx: &Context) -> TaskResult<()> {
    let paths = &ctx.config.paths.scripts;
    let set = PathSet::new(&paths.src)?;
    let entries = set.files(&ctx.root)?;

    if entries.is_empty() {
        ctx.reporter
            .debug(&format!("No script entry matches {}", paths.src.join(", ")));
        return Ok(());
    }

    let dest = Path::new(&paths.dest);
    let abs_dest = ctx.resolve(dest);
    fs::create_dir_all(&abs_dest).map_err(|e| TaskError::io(&abs_dest, e))?;

    let single = entries.len() == 1;
    for entry in &entries {
        // One entry keeps the configured output name; several keep their own
        let outfile = if single {
            dest.join(&ctx.config.scripts.output)
        } else {
            set.destination(entry, dest)
        };

        let vars = bundle_vars(ctx, entry, &outfile);
        run_command(&ctx.config.scripts.command, &vars, ctx)?;

        let produced = ctx.resolve(&outfile);
        if !produced.is_file() {
            return Err(TaskError::MissingOutput(produced));
        }
    }

    Ok(())
}
