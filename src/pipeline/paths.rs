//! Glob-based source sets
//!
//! A [`PathSet`] is an ordered list of glob patterns where a leading `!`
//! marks an exclusion. Every inclusion has its own literal base directory,
//! and files keep their path relative to the base of the inclusion they
//! matched when copied to a destination.

use crate::error::{ConfigError, ConfigResult, TaskError, TaskResult};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

#[derive(Debug, Clone)]
struct Include {
    matcher: GlobMatcher,
    base: PathBuf,
}

/// Include/exclude glob set with literal base directories
#[derive(Debug, Clone)]
pub struct PathSet {
    patterns: Vec<String>,
    includes: Vec<Include>,
    include: GlobSet,
    exclude: GlobSet,
    /// Directories whose whole subtree is excluded
    prune: GlobSet,
}

impl PathSet {
    /// Compile a pattern list
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> ConfigResult<Self> {
        let mut includes = Vec::new();
        let mut include = GlobSetBuilder::new();
        let mut exclude = GlobSetBuilder::new();
        let mut prune = GlobSetBuilder::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            match pattern.strip_prefix('!') {
                Some(negated) => {
                    exclude.add(compile(negated)?);
                    if let Some(dir) = subtree_root(negated) {
                        prune.add(compile(dir)?);
                    }
                }
                None => {
                    let glob = compile(pattern)?;
                    includes.push(Include {
                        matcher: glob.compile_matcher(),
                        base: glob_base(pattern),
                    });
                    include.add(glob);
                }
            }
        }

        Ok(PathSet {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            includes,
            include: include.build().map_err(|e| pattern_error(patterns, e))?,
            exclude: exclude.build().map_err(|e| pattern_error(patterns, e))?,
            prune: prune.build().map_err(|e| pattern_error(patterns, e))?,
        })
    }

    /// The patterns this set was built from
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Literal directory prefix of the first inclusion pattern
    pub fn base(&self) -> &Path {
        self.includes
            .first()
            .map(|i| i.base.as_path())
            .unwrap_or(Path::new(""))
    }

    /// Distinct inclusion bases, sorted, without bases nested in another
    pub fn bases(&self) -> Vec<&Path> {
        let mut bases: Vec<&Path> = self.includes.iter().map(|i| i.base.as_path()).collect();
        bases.sort();
        bases.dedup();

        let mut roots: Vec<&Path> = Vec::new();
        for base in bases {
            if !roots.iter().any(|root| base.starts_with(root)) {
                roots.push(base);
            }
        }
        roots
    }

    /// Check a path relative to the project root
    pub fn is_match(&self, rel: &Path) -> bool {
        self.include.is_match(rel) && !self.exclude.is_match(rel)
    }

    /// Whether nothing below the root-relative directory `rel` can match
    fn prunes(&self, rel: &Path) -> bool {
        self.prune.is_match(rel)
    }

    /// Enumerate matching files under `root`, as root-relative paths, sorted
    ///
    /// Each base is walked once; excluded subtrees are not descended into.
    pub fn files(&self, root: &Path) -> TaskResult<Vec<PathBuf>> {
        let mut files = BTreeSet::new();

        for base in self.bases() {
            let base_dir = root.join(base);
            if !base_dir.is_dir() {
                continue;
            }

            let walker = WalkDir::new(&base_dir).into_iter().filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map_or(true, |rel| !self.prunes(rel))
            });

            for entry in walker {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(base_dir.as_path()).to_path_buf();
                    TaskError::io(path, e.into())
                })?;
                // Follows symlinked files, not symlinked directories
                if !entry.path().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(root) else {
                    continue;
                };
                if self.is_match(rel) {
                    files.insert(rel.to_path_buf());
                }
            }
        }

        Ok(files.into_iter().collect())
    }

    /// Where a root-relative source lands below `dest`
    ///
    /// The path is taken relative to the base of the first inclusion it matches.
    pub fn destination(&self, rel: &Path, dest: &Path) -> PathBuf {
        let base = self
            .includes
            .iter()
            .find(|i| i.matcher.is_match(rel))
            .map(|i| i.base.as_path())
            .unwrap_or_else(|| self.base());
        dest.join(rel.strip_prefix(base).unwrap_or(rel))
    }
}

fn compile(pattern: &str) -> ConfigResult<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| ConfigError::Pattern {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })
}

/// `dir` for exclusions of the form `dir/**` or `dir/**/*`
fn subtree_root(pattern: &str) -> Option<&str> {
    let dir = pattern
        .strip_suffix("/**/*")
        .or_else(|| pattern.strip_suffix("/**"))?;
    (!dir.is_empty()).then_some(dir)
}

fn pattern_error<S: AsRef<str>>(patterns: &[S], error: globset::Error) -> ConfigError {
    ConfigError::Pattern {
        pattern: patterns
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        error: error.to_string(),
    }
}

/// Directory prefix of a glob up to its first wildcard component
///
/// The final component is always treated as a file name, so a literal
/// path like `src/app.scss` has base `src`.
fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let dirs = &components[..components.len().saturating_sub(1)];

    let mut base = PathBuf::new();
    for part in dirs {
        if part.contains(GLOB_META) {
            break;
        }
        match Path::new(part).components().next() {
            Some(Component::Normal(_)) => base.push(part),
            _ => continue,
        }
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_glob_base() {
        assert_eq!(glob_base("src/**/*.html"), PathBuf::from("src"));
        assert_eq!(
            glob_base("src/assets/scss/bundle.scss"),
            PathBuf::from("src/assets/scss")
        );
        assert_eq!(glob_base("**/*"), PathBuf::new());
        assert_eq!(glob_base("./src/*.js"), PathBuf::from("src"));
    }

    #[test]
    fn test_brace_alternation() {
        let set = PathSet::new(&["src/assets/images/**/*.{jpg,jpeg,png}"]).unwrap();
        assert!(set.is_match(Path::new("src/assets/images/logo.png")));
        assert!(set.is_match(Path::new("src/assets/images/photos/a.jpeg")));
        assert!(!set.is_match(Path::new("src/assets/images/icon.svg")));
    }

    #[test]
    fn test_exclusions() {
        let set = PathSet::new(&["src/assets/**/*", "!src/assets/{images,js,scss}/**/*"]).unwrap();
        assert!(set.is_match(Path::new("src/assets/fonts/a.woff2")));
        assert!(!set.is_match(Path::new("src/assets/js/bundle.js")));
        assert!(!set.is_match(Path::new("src/assets/scss/parts/_vars.scss")));
        assert_eq!(set.base(), Path::new("src/assets"));
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let set = PathSet::new(&["src/*.html"]).unwrap();
        assert!(set.is_match(Path::new("src/index.html")));
        assert!(!set.is_match(Path::new("src/pages/about.html")));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = PathSet::new(&["src/[unclosed"]);
        assert!(matches!(result, Err(ConfigError::Pattern { .. })));
    }

    #[test]
    fn test_files_and_destination() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/pages")).unwrap();
        fs::write(root.join("src/index.html"), "<p>").unwrap();
        fs::write(root.join("src/pages/about.html"), "<p>").unwrap();
        fs::write(root.join("src/readme.md"), "#").unwrap();

        let set = PathSet::new(&["src/**/*.html"]).unwrap();
        let files = set.files(root).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("src/index.html"),
                PathBuf::from("src/pages/about.html"),
            ]
        );

        let dest = set.destination(&files[1], Path::new("dist"));
        assert_eq!(dest, PathBuf::from("dist/pages/about.html"));
    }

    #[test]
    fn test_missing_base_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let set = PathSet::new(&["nowhere/**/*"]).unwrap();
        assert!(set.files(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_every_include_base_is_walked() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("templates/parts")).unwrap();
        fs::write(root.join("src/index.html"), "<p>").unwrap();
        fs::write(root.join("templates/parts/page.html"), "<p>").unwrap();

        let set = PathSet::new(&["src/**/*.html", "templates/**/*.html"]).unwrap();
        assert_eq!(set.bases(), vec![Path::new("src"), Path::new("templates")]);
        assert_eq!(
            set.files(root).unwrap(),
            vec![
                PathBuf::from("src/index.html"),
                PathBuf::from("templates/parts/page.html"),
            ]
        );

        // Each file keeps its path below the base it matched
        let dest = Path::new("dist");
        assert_eq!(
            set.destination(Path::new("templates/parts/page.html"), dest),
            PathBuf::from("dist/parts/page.html")
        );
        assert_eq!(
            set.destination(Path::new("src/index.html"), dest),
            PathBuf::from("dist/index.html")
        );
    }

    #[test]
    fn test_nested_bases_walked_once() {
        let set = PathSet::new(&["src/**/*.js", "src/vendor/*.js", "**/*.md"]).unwrap();
        assert_eq!(set.bases(), vec![Path::new("")]);

        let set = PathSet::new(&["src/**/*.js", "src/vendor/*.js"]).unwrap();
        assert_eq!(set.bases(), vec![Path::new("src")]);
    }

    #[test]
    fn test_excluded_subtrees_are_pruned() {
        let set = PathSet::new(&["**/*", "!node_modules/**", "!src/assets/{images,js}/**/*", "!*.log"])
            .unwrap();
        assert!(set.prunes(Path::new("node_modules")));
        assert!(set.prunes(Path::new("src/assets/js")));
        assert!(!set.prunes(Path::new("src/assets")));
        assert!(!set.prunes(Path::new("logs")));

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("style.css"), "x").unwrap();
        fs::write(root.join("debug.log"), "x").unwrap();

        assert_eq!(set.files(root).unwrap(), vec![PathBuf::from("style.css")]);
    }
}
