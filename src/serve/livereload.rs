//! Live-reload development server
//!
//! Serves the output directory, injects a small client script into HTML
//! pages and pushes reload events over Server-Sent Events. The server owns
//! a tokio runtime on a dedicated thread so the task runner stays
//! synchronous.

use crate::error::{ServeError, ServeResult};
use crate::runner::Context;
use crate::serve::{ReloadKind, Reloader};
use futures::Stream;
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::thread;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use warp::filters::path::Tail;
use warp::sse::Event;
use warp::{Filter, Rejection, Reply};

pub const EVENTS_PATH: &str = "/__livereload/events";
pub const SCRIPT_PATH: &str = "/__livereload.js";
pub const TRIGGER_PATH: &str = "/__livereload/reload";

const CLIENT_SCRIPT: &str = r#"(function () {
  var source = new EventSource("/__livereload/events");
  source.addEventListener("reload", function (event) {
    if (event.data === "css") {
      var links = document.querySelectorAll('link[rel="stylesheet"]');
      for (var i = 0; i < links.length; i++) {
        var url = new URL(links[i].href);
        url.searchParams.set("livereload", Date.now());
        links[i].href = url.toString();
      }
      return;
    }
    window.location.reload();
  });
})();
"#;

/// Where and what to serve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub host: String,
    pub port: u16,
    pub base_dir: PathBuf,
}

impl ServerOptions {
    /// Server settings for a build context; the base defaults to the html destination
    pub fn from_context(ctx: &Context) -> Self {
        let server = &ctx.config.server;
        let base = server
            .base_dir
            .clone()
            .unwrap_or_else(|| ctx.config.paths.html.dest.clone());

        ServerOptions {
            host: server.host.clone(),
            port: ctx.port,
            base_dir: ctx.resolve(base),
        }
    }
}

/// Cloneable sender for reload events
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: broadcast::Sender<ReloadKind>,
}

impl ReloadHandle {
    /// Broadcast an event; returns the number of browsers it reached
    pub fn send(&self, kind: ReloadKind) -> usize {
        let reached = self.tx.send(kind).unwrap_or(0);
        tracing::debug!(kind = %kind, clients = reached, "reload broadcast");
        reached
    }

    /// Number of connected browsers
    pub fn clients(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Reloader for ReloadHandle {
    fn reload(&self, kind: ReloadKind) {
        self.send(kind);
    }
}

/// A running live-reload server
///
/// Dropping the server shuts it down and joins its thread.
pub struct LiveReloadServer {
    addr: SocketAddr,
    handle: ReloadHandle,
    runtime: tokio::runtime::Handle,
    stop: watch::Sender<bool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl LiveReloadServer {
    /// Bind and start serving
    pub fn start(options: ServerOptions) -> ServeResult<Self> {
        let requested = format!("{}:{}", options.host, options.port);
        let addr = (options.host.as_str(), options.port)
            .to_socket_addrs()
            .map_err(|e| ServeError::Bind {
                addr: requested.clone(),
                error: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ServeError::Bind {
                addr: requested.clone(),
                error: "address did not resolve".to_string(),
            })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("livereload-worker")
            .enable_all()
            .build()?;

        let (tx, _) = broadcast::channel(16);
        let handle = ReloadHandle { tx };
        let (stop, stop_rx) = watch::channel(false);

        let routes = routes(options.base_dir, handle.clone(), stop_rx.clone());
        let (bound, server) = {
            let _guard = runtime.enter();
            let mut shutdown = stop_rx;
            warp::serve(routes)
                .try_bind_with_graceful_shutdown(addr, async move {
                    let _ = shutdown.changed().await;
                })
                .map_err(|e| ServeError::Bind {
                    addr: requested,
                    error: e.to_string(),
                })?
        };

        let runtime_handle = runtime.handle().clone();
        let thread = thread::Builder::new()
            .name("livereload".to_string())
            .spawn(move || runtime.block_on(server))?;

        tracing::debug!(addr = %bound, "live-reload server listening");

        Ok(LiveReloadServer {
            addr: bound,
            handle,
            runtime: runtime_handle,
            stop,
            thread: Some(thread),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn handle(&self) -> ReloadHandle {
        self.handle.clone()
    }

    /// Run `on_interrupt` once when Ctrl-C is received
    pub fn on_interrupt<F>(&self, on_interrupt: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt();
            }
        });
    }

    /// Close event streams, stop accepting connections and join the server thread
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        let _ = self.stop.send(true);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("live-reload server thread panicked");
            }
        }
    }
}

impl Drop for LiveReloadServer {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn routes(
    base: PathBuf,
    handle: ReloadHandle,
    stop: watch::Receiver<bool>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone + Send + Sync + 'static {
    let events_handle = handle.clone();
    let events = warp::get()
        .and(warp::path!("__livereload" / "events"))
        .map(move || {
            let stream = event_stream(events_handle.tx.subscribe(), stop.clone());
            warp::sse::reply(warp::sse::keep_alive().stream(stream))
        });

    let script = warp::get().and(warp::path!("__livereload.js")).map(|| {
        warp::reply::with_header(
            CLIENT_SCRIPT,
            "content-type",
            "application/javascript; charset=utf-8",
        )
    });

    let trigger = warp::post()
        .and(warp::path!("__livereload" / "reload"))
        .map(move || {
            let clients = handle.send(ReloadKind::Full);
            warp::reply::json(&serde_json::json!({ "clients": clients }))
        });

    let page_base = base.clone();
    let pages = warp::get()
        .and(warp::path::tail())
        .and_then(move |tail: Tail| serve_page(page_base.clone(), tail));

    let files = warp::get().and(warp::fs::dir(base));

    events.or(script).or(trigger).or(pages).or(files)
}

/// Reload events until the server stops or the broadcast closes
fn event_stream(
    rx: broadcast::Receiver<ReloadKind>,
    stop: watch::Receiver<bool>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    futures::stream::unfold((rx, stop), |(mut rx, mut stop)| async move {
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(kind) => {
                        let event = Event::default().event("reload").data(kind.as_str());
                        return Some((Ok(event), (rx, stop)));
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => return None,
                },
                _ = stop.changed() => return None,
            }
        }
    })
}

/// Serve an HTML page with the client script injected
async fn serve_page(base: PathBuf, tail: Tail) -> Result<warp::reply::Html<String>, Rejection> {
    let path = decode_request(tail.as_str())
        .and_then(|request| page_path(&base, &request))
        .ok_or_else(warp::reject::not_found)?;
    let markup = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| warp::reject::not_found())?;
    Ok(warp::reply::html(inject_script(&markup)))
}

/// Percent-decode a request path; `None` when it is not UTF-8
pub fn decode_request(request: &str) -> Option<String> {
    percent_decode_str(request)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Map a decoded request path to an HTML file below `base`
///
/// Returns `None` for non-HTML requests so the static file route handles them.
pub fn page_path(base: &Path, request: &str) -> Option<PathBuf> {
    let request = request.trim_start_matches('/');
    if request.split('/').any(|segment| segment == "..") {
        return None;
    }

    let mut path = base.join(request);
    if request.is_empty() || request.ends_with('/') || path.is_dir() {
        path = path.join("index.html");
    }

    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));

    is_html.then_some(path)
}

/// Insert the client script tag before the closing body tag
pub fn inject_script(markup: &str) -> String {
    let tag = format!(r#"<script src="{}" async></script>"#, SCRIPT_PATH);
    match markup.to_ascii_lowercase().rfind("</body>") {
        Some(index) => {
            let mut out = String::with_capacity(markup.len() + tag.len());
            out.push_str(&markup[..index]);
            out.push_str(&tag);
            out.push_str(&markup[index..]);
            out
        }
        None => format!("{}{}", markup, tag),
    }
}
