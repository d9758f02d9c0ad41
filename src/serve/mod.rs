//! Live reload and file watching
//!
//! [`livereload`] serves the output directory and pushes refresh signals to
//! browsers; [`watch`] maps file-system changes to task re-runs.

pub mod livereload;
pub mod watch;

pub use livereload::{LiveReloadServer, ReloadHandle, ServerOptions};

use crate::error::{TaskError, TaskResult};
use crate::runner::Context;
use std::fmt;
use std::time::Duration;

/// What connected browsers should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Reload the whole page
    Full,
    /// Re-fetch style sheets in place
    Css,
}

impl ReloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReloadKind::Full => "full",
            ReloadKind::Css => "css",
        }
    }
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for reload signals
pub trait Reloader: Send + Sync {
    fn reload(&self, kind: ReloadKind);
}

/// The reload task
///
/// In-process when a server is attached to the context, otherwise asks a
/// running `watch` over HTTP.
pub fn reload(ctx: &Context) -> TaskResult<()> {
    if let Some(reloader) = ctx.reloader() {
        reloader.reload(ReloadKind::Full);
        return Ok(());
    }

    let url = format!(
        "http://{}:{}{}",
        ctx.config.server.host,
        ctx.port,
        livereload::TRIGGER_PATH
    );
    let unreachable = |error: String| TaskError::ReloadUnreachable {
        url: url.clone(),
        error,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| unreachable(e.to_string()))?;
    let response = client
        .post(&url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| unreachable(e.to_string()))?;
    let body: serde_json::Value = response.json().map_err(|e| unreachable(e.to_string()))?;

    ctx.reporter.debug(&format!(
        "Reload sent to {} client(s)",
        body.get("clients").and_then(|c| c.as_u64()).unwrap_or(0)
    ));
    Ok(())
}
