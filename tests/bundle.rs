//! Integration tests for packaging

mod common;

use common::Fixture;
use rassets::pipeline::compress::archive_path;
use rassets::runner::{execute, resolve, BuildMode};
use std::fs::File;
use std::io::Read;

#[test]
fn test_bundle_packages_build_output() {
    let fixture = Fixture::new();
    let ctx = fixture.context(BuildMode::Production);
    let plan = resolve("bundle", &ctx.config).unwrap();
    execute(&plan, &ctx).unwrap();

    let archive = archive_path(&ctx);
    assert_eq!(archive, fixture.path("packaged/aurora.zip"));

    let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
    let names: Vec<String> = zip.file_names().map(String::from).collect();

    for expected in [
        "style.css",
        "functions.php",
        "dist/index.html",
        "dist/pages/about.html",
        "dist/assets/css/bundle.css",
        "dist/assets/js/bundle.js",
        "dist/assets/images/logo.png",
        "dist/assets/fonts/body.woff2",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }

    for name in &names {
        assert!(!name.starts_with("src/"), "packed {}", name);
        assert!(!name.starts_with("node_modules/"), "packed {}", name);
        assert!(!name.starts_with("packaged/"), "packed {}", name);
        assert_ne!(name, "rassets.yml");
        assert_ne!(name, "package.json");
    }

    let mut header = String::new();
    zip.by_name("style.css")
        .unwrap()
        .read_to_string(&mut header)
        .unwrap();
    assert_eq!(header, "/* Theme Name: aurora */\n");

    let mut page = String::new();
    zip.by_name("dist/index.html")
        .unwrap()
        .read_to_string(&mut page)
        .unwrap();
    assert!(page.contains("<title>aurora</title>"));
}

#[test]
fn test_package_name_from_config_block() {
    let fixture = Fixture::with_config(
        r#"
name: aurora
package:
  name: borealis
scripts:
  command: "cp ${entry} ${outfile}"
"#,
    );
    let ctx = fixture.context(BuildMode::Production);
    execute(&resolve("compress", &ctx.config).unwrap(), &ctx).unwrap();

    assert!(fixture.path("packaged/borealis.zip").is_file());
}
