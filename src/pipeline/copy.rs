//! Copy the remaining static assets

use crate::error::TaskResult;
use crate::pipeline::process_set;
use crate::runner::Context;

pub fn run(ctx: &Context) -> TaskResult<()> {
    let count = process_set(ctx, &ctx.config.paths.other, |_, bytes| Ok(bytes))?;
    ctx.reporter.debug(&format!("Copied {} file(s)", count));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_copy_skips_processed_subtrees() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for (path, body) in [
            ("src/assets/fonts/icons.woff2", "font"),
            ("src/assets/favicon.ico", "ico"),
            ("src/assets/js/bundle.js", "js"),
            ("src/assets/scss/bundle.scss", "scss"),
            ("src/assets/images/logo.png", "png"),
        ] {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, body).unwrap();
        }

        run(&Context::new(root, Config::default())).unwrap();

        let dist = root.join("dist/assets");
        assert_eq!(fs::read_to_string(dist.join("fonts/icons.woff2")).unwrap(), "font");
        assert!(dist.join("favicon.ico").is_file());
        assert!(!dist.join("js").exists());
        assert!(!dist.join("scss").exists());
        assert!(!dist.join("images").exists());
    }
}
