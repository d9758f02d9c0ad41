//! Configuration validation
//!
//! This module checks a parsed configuration before any task runs, so
//! mistakes surface up front instead of halfway through a build.

use crate::config::types::{AssetPaths, Config};
use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::{scripts, styles, PathSet};
use crate::runner::{interpolate_strict, pipeline_definitions, resolve, resolve_steps, TaskName};
use std::collections::HashMap;
use std::path::{Component, Path};

/// Subcommand names the CLI defines itself
const RESERVED_NAMES: &[&str] = &["completions", "help"];

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() || interpreter[0].trim().is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name a program".to_string(),
            ));
        }
    }

    for dir in &config.clean {
        validate_clean_entry(dir)?;
    }

    let paths = &config.paths;
    for (name, block) in [
        ("html", &paths.html),
        ("styles", &paths.styles),
        ("images", &paths.images),
        ("scripts", &paths.scripts),
        ("other", &paths.other),
        ("package", &paths.package),
    ] {
        validate_asset_paths(name, block)?;
    }

    styles::browser_targets(&config.styles.targets)?;
    validate_command_template(&config.scripts.command)?;

    // Pipelines must not hide a task, and must resolve
    for name in config.pipelines.keys() {
        if name.parse::<TaskName>().is_ok() {
            return Err(ConfigError::ShadowsTask(name.clone()));
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "pipeline name '{}' is reserved",
                name
            )));
        }
    }
    for name in pipeline_definitions(config).keys() {
        resolve(name, config)?;
    }
    resolve(&config.default, config)?;

    if let Some(rules) = &config.watch {
        for rule in rules {
            if rule.paths.is_empty() {
                return Err(ConfigError::Invalid(
                    "watch rule has no paths".to_string(),
                ));
            }
            PathSet::new(&rule.paths)?;
            resolve_steps(&rule.run, config)?;
        }
    }

    Ok(())
}

fn validate_asset_paths(name: &str, block: &AssetPaths) -> ConfigResult<()> {
    if !block.src.iter().any(|p| !p.trim().starts_with('!')) {
        return Err(ConfigError::Invalid(format!(
            "paths.{} needs at least one source pattern",
            name
        )));
    }
    if block.dest.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("paths.{} has no dest", name)));
    }
    PathSet::new(&block.src)?;
    Ok(())
}

/// Every variable in the bundler command must be known or set in the environment
fn validate_command_template(template: &str) -> ConfigResult<()> {
    let vars: HashMap<String, String> = scripts::BUNDLE_VARS
        .iter()
        .map(|name| (name.to_string(), String::new()))
        .collect();
    interpolate_strict(template, &vars)
        .map_err(|e| ConfigError::Invalid(format!("scripts.command: {}", e)))?;
    Ok(())
}

/// Clean entries must stay inside the project
fn validate_clean_entry(dir: &str) -> ConfigResult<()> {
    let path = Path::new(dir.trim());
    let escapes = path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    let empty = !path
        .components()
        .any(|c| matches!(c, Component::Normal(_)));

    if escapes || empty {
        return Err(ConfigError::Invalid(format!(
            "refusing to clean '{}': entries must be directories inside the project",
            dir
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{StepConfig, WatchRuleConfig};

    fn name(s: &str) -> StepConfig {
        StepConfig::Name(s.to_string())
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_clean_entries() {
        assert!(validate_clean_entry("dist").is_ok());
        assert!(validate_clean_entry("./build/cache").is_ok());
        for bad in ["", ".", "..", "../dist", "/tmp", "dist/../.."] {
            assert!(validate_clean_entry(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_pipeline_shadowing_task() {
        let mut config = Config::default();
        config.pipelines.insert("styles".to_string(), vec![name("html")]);

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ShadowsTask(n)) if n == "styles"));
    }

    #[test]
    fn test_reserved_pipeline_name() {
        let mut config = Config::default();
        config
            .pipelines
            .insert("completions".to_string(), vec![name("html")]);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_pipeline_unknown_step() {
        let mut config = Config::default();
        config.pipelines.insert("ci".to_string(), vec![name("lint")]);

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::TaskNotFound(n)) if n == "lint"));
    }

    #[test]
    fn test_circular_pipelines() {
        let mut config = Config::default();
        config.pipelines.insert("a".to_string(), vec![name("b")]);
        config.pipelines.insert("b".to_string(), vec![name("a")]);

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::CircularPipeline(_))));
    }

    #[test]
    fn test_unknown_default() {
        let mut config = Config::default();
        config.default = "release".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_bad_glob() {
        let mut config = Config::default();
        config.paths.images.src = vec!["src/images/[".to_string()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Pattern { .. })
        ));
    }

    #[test]
    fn test_only_exclusions() {
        let mut config = Config::default();
        config.paths.other.src = vec!["!src/**/*.tmp".to_string()];
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_watch_rule_steps() {
        let mut config = Config::default();
        config.watch = Some(vec![WatchRuleConfig {
            paths: vec!["src/**/*.html".to_string()],
            run: vec![name("html"), name("reload")],
        }]);
        assert!(validate_config(&config).is_ok());

        config.watch = Some(vec![WatchRuleConfig {
            paths: vec!["src/**/*.html".to_string()],
            run: vec![name("publish")],
        }]);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_interpreter() {
        let mut config = Config::default();
        config.interpreter = Some(vec![]);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_command_template_variables() {
        assert!(validate_command_template("esbuild ${entry} --outfile=${outfile} ${flags}").is_ok());
        assert!(validate_command_template("cd ${root} && echo ${name} ${mode} > ${outdir}/x").is_ok());

        let mut config = Config::default();
        config.scripts.command = "esbuild ${entyr} --outfile=${outfile}".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::Invalid(m)) if m.contains("entyr")));
    }
}
