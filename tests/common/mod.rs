//! Common test utilities

#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rassets::config::{parse_config, Config};
use rassets::runner::{BuildMode, Context};
use rassets::ui::{Reporter, Verbosity};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A 1x1 PNG
const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn pixel_png() -> Vec<u8> {
    STANDARD.decode(PIXEL_PNG).unwrap()
}

/// Stand-in bundler: copies the entry and appends the flags it was given
const CONFIG: &str = r#"
name: aurora
scripts:
  command: "cp ${entry} ${outfile} && echo '// ${flags}' >> ${outfile}"
"#;

/// A temporary theme project with one file of every asset class
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(CONFIG)
    }

    pub fn with_config(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let fixture = Fixture { dir };

        fixture.write("rassets.yml", config);
        fixture.write(
            "src/index.html",
            "<!DOCTYPE html>\n<html>\n  <head>\n    <!-- page head -->\n    <title>_themename</title>\n  </head>\n  <body>\n    <p>Hello,   world</p>\n  </body>\n</html>\n",
        );
        fixture.write(
            "src/pages/about.html",
            "<html>\n  <body>\n    <h1>About</h1>\n  </body>\n</html>\n",
        );
        fixture.write(
            "src/assets/scss/bundle.scss",
            "@import \"parts/colors\";\n\nbody {\n  color: $ink;\n  .title { margin: 0 auto; }\n}\n",
        );
        fixture.write("src/assets/scss/parts/_colors.scss", "$ink: #333333;\n");
        fixture.write(
            "src/assets/js/bundle.js",
            "import './main/app.js';\nconsole.log('bundle');\n",
        );
        fixture.write("src/assets/js/main/app.js", "export const app = 1;\n");
        fixture.write_bytes("src/assets/images/logo.png", &pixel_png());
        fixture.write("src/assets/fonts/body.woff2", "font");
        fixture.write("style.css", "/* Theme Name: _themename */\n");
        fixture.write("functions.php", "<?php // _themename\n");
        fixture.write("package.json", "{}\n");
        fixture.write("node_modules/left-pad/index.js", "module.exports = 1;\n");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        self.write_bytes(rel, contents.as_bytes());
    }

    pub fn write_bytes(&self, rel: &str, contents: &[u8]) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {}: {}", rel, e))
    }

    pub fn config(&self) -> Config {
        parse_config(&self.read("rassets.yml")).unwrap()
    }

    /// A silent context for this project
    pub fn context(&self, mode: BuildMode) -> Context {
        Context::new(self.root(), self.config())
            .with_mode(mode)
            .with_reporter(Reporter::new(Verbosity::Silent))
    }
}
