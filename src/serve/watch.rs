//! File watching
//!
//! A dispatch table maps path sets to task plans. File-system events are
//! coalesced over a short window, then every matching rule runs once.

use crate::config::{Config, StepConfig, WatchRuleConfig};
use crate::error::{ConfigResult, TaskError, TaskResult};
use crate::pipeline::PathSet;
use crate::runner::{execute, resolve_steps, Context, Step};
use crate::serve::{LiveReloadServer, ServerOptions};
use notify::event::{EventKind, ModifyKind};
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Input to the dispatch loop
#[derive(Debug)]
pub enum WatchMessage {
    Changed(Vec<PathBuf>),
    Shutdown,
}

/// One row of the dispatch table
#[derive(Debug, Clone)]
pub struct WatchRule {
    pub paths: PathSet,
    pub step: Step,
}

#[derive(Debug, Clone)]
pub struct DispatchTable {
    rules: Vec<WatchRule>,
}

/// The stock table, derived from the configured asset paths
pub fn default_rules(config: &Config) -> ConfigResult<Vec<WatchRuleConfig>> {
    fn rule(paths: Vec<String>, run: &[&str]) -> WatchRuleConfig {
        WatchRuleConfig {
            paths,
            run: run.iter().map(|s| StepConfig::Name(s.to_string())).collect(),
        }
    }

    let under = |src: &[String], pattern: &str| -> ConfigResult<Vec<String>> {
        let set = PathSet::new(src)?;
        Ok(set
            .bases()
            .into_iter()
            .map(|base| {
                if base.as_os_str().is_empty() {
                    pattern.to_string()
                } else {
                    format!("{}/{}", base.display(), pattern)
                }
            })
            .collect())
    };

    let paths = &config.paths;
    Ok(vec![
        rule(paths.html.src.clone(), &["html"]),
        rule(under(&paths.styles.src, "**/*.scss")?, &["styles"]),
        rule(under(&paths.scripts.src, "**/*.js")?, &["scripts", "reload"]),
        rule(paths.images.src.clone(), &["images", "reload"]),
        rule(paths.other.src.clone(), &["copy", "reload"]),
    ])
}

impl DispatchTable {
    /// Build the table from config, falling back to the stock rules
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let rules = match &config.watch {
            Some(rules) => rules.clone(),
            None => default_rules(config)?,
        };

        let rules = rules
            .iter()
            .map(|rule| {
                Ok(WatchRule {
                    paths: PathSet::new(&rule.paths)?,
                    step: resolve_steps(&rule.run, config)?,
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(DispatchTable { rules })
    }

    pub fn rules(&self) -> &[WatchRule] {
        &self.rules
    }

    /// Rules touched by any of the changed paths, in table order
    pub fn matching(&self, roots: &[PathBuf], changed: &[PathBuf]) -> Vec<&WatchRule> {
        let relative: Vec<&Path> = changed
            .iter()
            .filter_map(|path| roots.iter().find_map(|root| path.strip_prefix(root).ok()))
            .collect();

        self.rules
            .iter()
            .filter(|rule| relative.iter().any(|rel| rule.paths.is_match(rel)))
            .collect()
    }

    /// Existing directories to watch, without nested duplicates
    pub fn watch_roots(&self, root: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .rules
            .iter()
            .flat_map(|rule| rule.paths.bases())
            .map(|base| root.join(base))
            .filter(|dir| dir.is_dir())
            .collect();
        dirs.sort();
        dirs.dedup();

        let mut roots: Vec<PathBuf> = Vec::new();
        for dir in dirs {
            if !roots.iter().any(|r| dir.starts_with(r)) {
                roots.push(dir);
            }
        }
        roots
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        _ => false,
    }
}

/// Root paths that event paths may be reported under
fn event_roots(root: &Path) -> Vec<PathBuf> {
    let mut roots = vec![root.to_path_buf()];
    if let Ok(canonical) = root.canonicalize() {
        if canonical != root {
            roots.push(canonical);
        }
    }
    roots
}

/// Run every rule matching `changed`; failures are reported, not returned
///
/// Returns the number of rules that fired.
pub fn dispatch(ctx: &Context, table: &DispatchTable, changed: &[PathBuf]) -> usize {
    let rules = table.matching(&event_roots(&ctx.root), changed);
    for rule in &rules {
        tracing::debug!(patterns = ?rule.paths.patterns(), "watch rule fired");
        if let Err(e) = execute(&rule.step, ctx) {
            tracing::debug!(error = %e, "watch rule failed");
        }
    }
    rules.len()
}

/// Consume messages until shutdown, coalescing bursts over `debounce`
pub fn dispatch_loop(
    ctx: &Context,
    table: &DispatchTable,
    rx: &Receiver<WatchMessage>,
    debounce: Duration,
) -> TaskResult<()> {
    loop {
        let mut changed = match rx.recv() {
            Ok(WatchMessage::Changed(paths)) => paths,
            Ok(WatchMessage::Shutdown) | Err(_) => return Ok(()),
        };

        loop {
            match rx.recv_timeout(debounce) {
                Ok(WatchMessage::Changed(more)) => changed.extend(more),
                Ok(WatchMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        changed.sort();
        changed.dedup();
        dispatch(ctx, table, &changed);
    }
}

/// The watch task: serve, watch, rebuild, reload
pub fn run(ctx: &Context) -> TaskResult<()> {
    let (tx, rx) = mpsc::channel();
    run_until(ctx, tx, rx)
}

/// Serve and watch until `Shutdown` arrives on `rx`
///
/// `tx` feeds the same channel: file events and Ctrl-C are sent through it.
pub fn run_until(
    ctx: &Context,
    tx: Sender<WatchMessage>,
    rx: Receiver<WatchMessage>,
) -> TaskResult<()> {
    let table = DispatchTable::from_config(&ctx.config)?;
    let options = ServerOptions::from_context(ctx);
    let base = options.base_dir.clone();
    let server = LiveReloadServer::start(options)?;
    ctx.reporter
        .info(&format!("Serving {} at {}", base.display(), server.url()));

    let events = tx.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if is_relevant(&event.kind) => {
                let _ = events.send(WatchMessage::Changed(event.paths));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "file watcher error"),
        }
    })
    .map_err(|e| TaskError::Watch(e.to_string()))?;

    let mut roots = table.watch_roots(&ctx.root);
    if roots.is_empty() {
        roots.push(ctx.root.clone());
    }
    for dir in &roots {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| TaskError::Watch(format!("{}: {}", dir.display(), e)))?;
        ctx.reporter.debug(&format!("Watching {}", dir.display()));
    }

    server.on_interrupt(move || {
        let _ = tx.send(WatchMessage::Shutdown);
    });

    let live = ctx.clone().with_reloader(Arc::new(server.handle()));
    let debounce = Duration::from_millis(ctx.config.server.debounce_ms);
    let result = dispatch_loop(&live, &table, &rx, debounce);

    drop(watcher);
    server.shutdown();
    ctx.reporter.info("Stopped watching");
    result
}
