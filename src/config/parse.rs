//! Configuration file parsing and discovery

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, RassetsError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["rassets.yml", "rassets.yaml"];

/// Find the configuration file by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the configuration file starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a configuration file from a path
pub fn parse_config_file(path: &Path) -> Result<Config, RassetsError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_config(&contents)
}

/// Parse configuration from a string
///
/// An empty document yields the default configuration.
pub fn parse_config(yaml: &str) -> Result<Config, RassetsError> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// A loaded project: its configuration and the directory tasks run against
#[derive(Debug, Clone)]
pub struct Project {
    pub config: Config,
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
}

/// Load the project for an explicit config file
pub fn load_project_file(path: &Path) -> Result<Project, RassetsError> {
    let config = parse_config_file(path)?;
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => env::current_dir()?,
    };

    Ok(Project {
        config,
        root,
        config_path: Some(path.to_path_buf()),
    })
}

/// Load the project by searching upward from `start_dir`
///
/// Without a config file the stock layout is used with `start_dir` as root.
pub fn load_project_from(start_dir: PathBuf) -> Result<Project, RassetsError> {
    match find_config_file_from(start_dir.clone()) {
        Ok(path) => load_project_file(&path),
        Err(ConfigError::NotFound(_)) => Ok(Project {
            config: Config::default(),
            root: start_dir,
            config_path: None,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Load the project with automatic file discovery from the current directory
pub fn load_project_auto() -> Result<Project, RassetsError> {
    load_project_from(env::current_dir()?)
}
