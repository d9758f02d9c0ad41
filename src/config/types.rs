//! Core configuration types
//!
//! This module defines the data structures that represent a rassets.yml configuration file.
//! Every key is optional; the defaults reproduce the stock theme layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Project name, used for the package archive (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Usage description shown in help (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    /// Pipeline or task run when no subcommand is given
    #[serde(default = "default_entry")]
    pub default: String,

    /// Interpreter used for external commands (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Directories removed by the clean task
    #[serde(default = "default_clean", deserialize_with = "deserialize_strings")]
    pub clean: Vec<String>,

    /// Source globs and destinations per asset class
    #[serde(default)]
    pub paths: Paths,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub package: PackageConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Watch dispatch table; the stock table is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<Vec<WatchRuleConfig>>,

    /// Named pipelines, overriding or extending dev/build/bundle
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pipelines: BTreeMap<String, Vec<StepConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: None,
            usage: None,
            default: default_entry(),
            interpreter: None,
            clean: default_clean(),
            paths: Paths::default(),
            styles: StylesConfig::default(),
            scripts: ScriptsConfig::default(),
            package: PackageConfig::default(),
            server: ServerConfig::default(),
            watch: None,
            pipelines: BTreeMap::new(),
        }
    }
}

fn default_entry() -> String {
    "dev".to_string()
}

fn default_clean() -> Vec<String> {
    vec!["dist".to_string()]
}

/// Source set and destination for one asset class
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssetPaths {
    /// Glob patterns; a leading `!` excludes
    #[serde(deserialize_with = "deserialize_strings")]
    pub src: Vec<String>,

    /// Output directory, relative to the project root
    pub dest: String,
}

impl AssetPaths {
    fn new(src: &[&str], dest: &str) -> Self {
        AssetPaths {
            src: src.iter().map(|s| s.to_string()).collect(),
            dest: dest.to_string(),
        }
    }
}

/// Per-asset path table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Paths {
    pub html: AssetPaths,
    pub styles: AssetPaths,
    pub images: AssetPaths,
    pub scripts: AssetPaths,
    pub other: AssetPaths,
    pub package: AssetPaths,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            html: AssetPaths::new(&["src/**/*.html"], "dist/"),
            styles: AssetPaths::new(&["src/assets/scss/bundle.scss"], "dist/assets/css"),
            images: AssetPaths::new(
                &["src/assets/images/**/*.{jpg,jpeg,png}"],
                "dist/assets/images",
            ),
            scripts: AssetPaths::new(&["src/assets/js/bundle.js"], "dist/assets/js"),
            other: AssetPaths::new(
                &["src/assets/**/*", "!src/assets/{images,js,scss}/**/*"],
                "dist/assets/",
            ),
            package: AssetPaths::new(
                &[
                    "**/*",
                    "!.git/**",
                    "!.vscode/**",
                    "!node_modules/**",
                    "!packaged/**",
                    "!src/**",
                    "!.babelrc",
                    "!.gitignore",
                    "!.env",
                    "!rassets.yml",
                    "!rassets.yaml",
                    "!package.json",
                    "!package-lock.json",
                ],
                "packaged",
            ),
        }
    }
}

/// Style compilation settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Browserslist queries used for vendor prefixing in production
    #[serde(deserialize_with = "deserialize_strings")]
    pub targets: Vec<String>,
}

/// External bundler settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Command template, interpolated with ${entry}, ${outfile}, ${outdir}, ${mode}, ${flags}
    pub command: String,

    /// Output file name inside the scripts destination
    pub output: String,

    #[serde(rename = "production-flags")]
    pub production_flags: String,

    #[serde(rename = "development-flags")]
    pub development_flags: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        ScriptsConfig {
            command: "esbuild ${entry} --bundle --outfile=${outfile} --external:jQuery ${flags}"
                .to_string(),
            output: "bundle.js".to_string(),
            production_flags: "--minify".to_string(),
            development_flags: "--sourcemap=inline".to_string(),
        }
    }
}

/// Package archive settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Archive and replacement name; falls back to the config name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Placeholder replaced with the package name in text files
    pub token: String,
}

impl Default for PackageConfig {
    fn default() -> Self {
        PackageConfig {
            name: None,
            token: "_themename".to_string(),
        }
    }
}

/// Live-reload server settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Served directory; defaults to the html destination
    #[serde(rename = "base-dir", skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<String>,

    /// Window over which file events are coalesced
    #[serde(rename = "debounce-ms")]
    pub debounce_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_dir: None,
            debounce_ms: 100,
        }
    }
}

/// One row of the watch dispatch table
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WatchRuleConfig {
    /// Globs whose changes trigger the rule
    #[serde(deserialize_with = "deserialize_strings")]
    pub paths: Vec<String>,

    /// Steps run, in series, when the rule fires
    #[serde(deserialize_with = "deserialize_steps")]
    pub run: Vec<StepConfig>,
}

/// A pipeline step: a task or pipeline name, or a nested group
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum StepConfig {
    /// Task or pipeline name
    Name(String),

    /// Steps run concurrently
    Parallel { parallel: Vec<StepConfig> },

    /// Steps run one after another
    Series { series: Vec<StepConfig> },
}

impl StepConfig {
    /// Every task or pipeline name referenced by this step
    pub fn names(&self) -> Vec<&str> {
        match self {
            StepConfig::Name(name) => vec![name.as_str()],
            StepConfig::Parallel { parallel: steps } | StepConfig::Series { series: steps } => {
                steps.iter().flat_map(|s| s.names()).collect()
            }
        }
    }
}

/// Custom deserializer for string lists that accepts a single string too
fn deserialize_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| String::deserialize(item).map_err(D::Error::custom))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}

/// Custom deserializer for steps that handles both single values and arrays
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<StepConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![StepConfig::Name(s)]),
        Value::Mapping(_) => {
            let step = StepConfig::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![step])
        }
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| StepConfig::deserialize(item).map_err(D::Error::custom))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("run must be a string, object, or array")),
    }
}
