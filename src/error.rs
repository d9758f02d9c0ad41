//! Error types for Rassets

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Rassets operations
pub type Result<T> = std::result::Result<T, RassetsError>;

/// Main error type for Rassets
#[derive(Error, Debug)]
pub enum RassetsError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Live-reload server errors
    #[error("Server error: {0}")]
    Serve(#[from] ServeError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Pipeline '{0}' shadows a built-in task")]
    ShadowsTask(String),

    #[error("Circular pipeline detected: {0}")]
    CircularPipeline(String),

    #[error("Invalid glob pattern '{pattern}': {error}")]
    Pattern { pattern: String, error: String },

    #[error("Failed to read config file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Errors raised while running a build task
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to compile '{path}': {message}")]
    Style { path: PathBuf, message: String },

    #[error("Failed to process CSS for '{path}': {message}")]
    Css { path: PathBuf, message: String },

    #[error("Failed to optimize image '{path}': {message}")]
    Image { path: PathBuf, message: String },

    #[error("Expected output '{0}' was not produced")]
    MissingOutput(PathBuf),

    #[error("Failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("No live-reload server answered at {url}: {error}")]
    ReloadUnreachable { url: String, error: String },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serve(#[from] ServeError),
}

/// Live-reload server errors
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },

    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for task operations
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Specialized result type for server operations
pub type ServeResult<T> = std::result::Result<T, ServeError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

impl TaskError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }
}
