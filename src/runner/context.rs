//! Execution context for task running
//!
//! The context is immutable once built and shared by reference across
//! parallel tasks. The build mode lives here rather than in a global.

use crate::config::Config;
use crate::serve::{ReloadKind, Reloader};
use crate::ui::Reporter;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Production or development build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn from_flag(production: bool) -> Self {
        if production {
            BuildMode::Production
        } else {
            BuildMode::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == BuildMode::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

/// Execution context shared by every task of a run
#[derive(Clone)]
pub struct Context {
    /// Project root; all configured paths are relative to it
    pub root: PathBuf,

    /// Build mode
    pub mode: BuildMode,

    /// Parsed configuration
    pub config: Arc<Config>,

    /// Interpreter for external commands (e.g., ["sh", "-c"])
    pub interpreter: Vec<String>,

    /// Progress output
    pub reporter: Reporter,

    /// Live-reload server port
    pub port: u16,

    reloader: Option<Arc<dyn Reloader>>,
}

impl Context {
    /// Create a development context for a project root
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        let interpreter = config
            .interpreter
            .clone()
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| vec!["sh".to_string(), "-c".to_string()]);
        let port = config.server.port;

        Context {
            root: root.into(),
            mode: BuildMode::Development,
            config: Arc::new(config),
            interpreter,
            reporter: Reporter::default(),
            port,
            reloader: None,
        }
    }

    /// Set the build mode
    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the reporter
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Override the live-reload port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Attach a live-reload channel that tasks stream into
    pub fn with_reloader(mut self, reloader: Arc<dyn Reloader>) -> Self {
        self.reloader = Some(reloader);
        self
    }

    pub fn is_production(&self) -> bool {
        self.mode.is_production()
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// The attached live-reload channel, if any
    pub fn reloader(&self) -> Option<&dyn Reloader> {
        self.reloader.as_deref()
    }

    /// Push a reload to connected browsers when a server is attached
    pub fn stream(&self, kind: ReloadKind) {
        if let Some(reloader) = &self.reloader {
            reloader.reload(kind);
        }
    }

    /// Name used for the package archive and placeholder substitution
    pub fn package_name(&self) -> String {
        self.config
            .package
            .name
            .clone()
            .or_else(|| self.config.name.clone())
            .or_else(|| {
                self.root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "package".to_string())
    }

    /// Variables available to command templates
    pub fn vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), self.package_name());
        vars.insert("mode".to_string(), self.mode.as_str().to_string());
        vars.insert("root".to_string(), self.root.display().to_string());
        vars
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .field("interpreter", &self.interpreter)
            .field("port", &self.port)
            .field("reloader", &self.reloader.is_some())
            .finish()
    }
}
