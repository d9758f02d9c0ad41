//! Sass compilation
//!
//! grass compiles the entry file; lightningcss then minifies (production)
//! or prints with an inline source map (development).

use crate::error::{ConfigError, ConfigResult, TaskError, TaskResult};
use crate::pipeline::{write_file, PathSet};
use crate::runner::{BuildMode, Context};
use crate::serve::ReloadKind;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use std::fmt::Display;
use std::path::Path;

/// Build lightningcss targets from browserslist queries
pub fn browser_targets(queries: &[String]) -> ConfigResult<Targets> {
    if queries.is_empty() {
        return Ok(Targets::default());
    }

    let browsers = Browsers::from_browserslist(queries.iter().map(String::as_str))
        .map_err(|e| ConfigError::Invalid(format!("styles.targets: {}", e)))?;

    Ok(browsers.map(Targets::from).unwrap_or_default())
}

/// Compile a Sass file to expanded CSS
pub fn compile_sass(path: &Path) -> TaskResult<String> {
    let options = grass::Options::default().style(grass::OutputStyle::Expanded);
    grass::from_path(path, &options).map_err(|e| TaskError::Style {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Post-process compiled CSS for the build mode
///
/// The development source map points into the expanded Sass output, which
/// is embedded as the map's only source under the `.css` name of `path`.
/// grass does not track Sass positions, so the map never claims them.
pub fn finish_css(css: &str, path: &Path, mode: BuildMode, targets: Targets) -> TaskResult<String> {
    let source_name = path.with_extension("css").display().to_string();
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: source_name.clone(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| css_error(path, e))?;

    if mode.is_production() {
        sheet
            .minify(MinifyOptions {
                targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| css_error(path, e))?;
        let printed = sheet
            .to_css(PrinterOptions {
                minify: true,
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| css_error(path, e))?;
        return Ok(printed.code);
    }

    let mut map = SourceMap::new("/");
    map.add_source(&source_name);
    map.set_source_content(0, css)
        .map_err(|e| css_error(path, format!("{:?}", e)))?;

    let printed = sheet
        .to_css(PrinterOptions {
            source_map: Some(&mut map),
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(path, e))?;

    let json = map
        .to_json(None)
        .map_err(|e| css_error(path, format!("{:?}", e)))?;

    Ok(format!(
        "{}\n/*# sourceMappingURL=data:application/json;charset=utf-8;base64,{} */\n",
        printed.code,
        STANDARD.encode(json)
    ))
}

fn css_error(path: &Path, error: impl Display) -> TaskError {
    TaskError::Css {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

/// Sass partials are only compiled through an entry file
fn is_partial(rel: &Path) -> bool {
    rel.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

pub fn run(ctx: &Context) -> TaskResult<()> {
    let paths = &ctx.config.paths.styles;
    let set = PathSet::new(&paths.src)?;
    let dest = ctx.resolve(&paths.dest);
    let targets = browser_targets(&ctx.config.styles.targets)?;

    for rel in set.files(&ctx.root)? {
        if is_partial(&rel) {
            continue;
        }

        let compiled = compile_sass(&ctx.resolve(&rel))?;
        let css = finish_css(&compiled, &rel, ctx.mode, targets)?;

        let target = set.destination(&rel, &dest).with_extension("css");
        tracing::debug!(source = %rel.display(), target = %target.display(), "compiled style sheet");
        write_file(&target, css.as_bytes())?;
    }

    ctx.stream(ReloadKind::Css);
    Ok(())
}
