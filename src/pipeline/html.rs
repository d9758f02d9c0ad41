//! HTML pages

use crate::error::TaskResult;
use crate::pipeline::process_set;
use crate::runner::Context;
use crate::serve::ReloadKind;

/// Collapse whitespace and strip comments
///
/// Closing tags and the html/head tags are kept, and inline CSS and JS are
/// left as written.
pub fn minify(markup: &[u8]) -> Vec<u8> {
    let cfg = minify_html::Cfg {
        keep_closing_tags: true,
        keep_html_and_head_opening_tags: true,
        keep_comments: false,
        minify_css: false,
        minify_js: false,
        ..minify_html::Cfg::default()
    };
    minify_html::minify(markup, &cfg)
}

pub fn run(ctx: &Context) -> TaskResult<()> {
    let production = ctx.is_production();
    let count = process_set(ctx, &ctx.config.paths.html, |_, bytes| {
        Ok(if production { minify(&bytes) } else { bytes })
    })?;

    ctx.reporter.debug(&format!("Wrote {} page(s)", count));
    ctx.stream(ReloadKind::Full);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::runner::BuildMode;
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Theme</title>
  </head>
  <body>
    <!-- navigation -->
    <p>
      Hello    world
    </p>
  </body>
</html>
"#;

    #[test]
    fn test_minify_strips_comments_and_whitespace() {
        let out = String::from_utf8(minify(PAGE.as_bytes())).unwrap();
        assert!(!out.contains("<!--"));
        assert!(!out.contains("navigation"));
        assert!(out.contains("</p>"));
        assert!(out.len() < PAGE.len());
    }

    fn write_page(root: &std::path::Path) {
        fs::create_dir_all(root.join("src/about")).unwrap();
        fs::write(root.join("src/index.html"), PAGE).unwrap();
        fs::write(root.join("src/about/index.html"), PAGE).unwrap();
    }

    #[test]
    fn test_development_copies_verbatim() {
        let temp = TempDir::new().unwrap();
        write_page(temp.path());

        run(&Context::new(temp.path(), Config::default())).unwrap();

        let out = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
        assert_eq!(out, PAGE);
        assert!(temp.path().join("dist/about/index.html").is_file());
    }

    #[test]
    fn test_production_minifies() {
        let temp = TempDir::new().unwrap();
        write_page(temp.path());

        let ctx = Context::new(temp.path(), Config::default()).with_mode(BuildMode::Production);
        run(&ctx).unwrap();

        let out = fs::read_to_string(temp.path().join("dist/about/index.html")).unwrap();
        assert!(!out.contains("<!--"));
        assert!(out.len() < PAGE.len());
    }
}
