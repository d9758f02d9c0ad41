//! Integration tests for the watch dispatch loop

mod common;

use common::Fixture;
use rassets::runner::{execute, resolve, BuildMode};
use rassets::serve::watch::{dispatch, dispatch_loop, run_until, DispatchTable, WatchMessage};
use rassets::serve::{ReloadKind, Reloader};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Records every reload it is asked for
#[derive(Default)]
struct Recorder {
    kinds: Mutex<Vec<ReloadKind>>,
}

impl Reloader for Recorder {
    fn reload(&self, kind: ReloadKind) {
        self.kinds.lock().unwrap().push(kind);
    }
}

impl Recorder {
    fn kinds(&self) -> Vec<ReloadKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[test]
fn test_style_change_recompiles_without_restart() {
    let fixture = Fixture::new();
    let ctx = fixture.context(BuildMode::Development);
    execute(&resolve("build", &ctx.config).unwrap(), &ctx).unwrap();
    assert!(!fixture.read("dist/assets/css/bundle.css").contains(".changed"));

    let recorder = Arc::new(Recorder::default());
    let live = ctx.clone().with_reloader(recorder.clone());
    let table = DispatchTable::from_config(&live.config).unwrap();

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        dispatch_loop(&live, &table, &rx, Duration::from_millis(20))
    });

    // Edit a partial twice in quick succession
    fixture.write(
        "src/assets/scss/parts/_colors.scss",
        "$ink: #333333;\n.changed { display: none; }\n",
    );
    let partial = fixture.path("src/assets/scss/parts/_colors.scss");
    tx.send(WatchMessage::Changed(vec![partial.clone()])).unwrap();
    tx.send(WatchMessage::Changed(vec![partial])).unwrap();

    thread::sleep(Duration::from_millis(500));
    tx.send(WatchMessage::Shutdown).unwrap();
    worker.join().unwrap().unwrap();

    let css = fixture.read("dist/assets/css/bundle.css");
    assert!(css.contains(".changed"), "stale css: {}", css);
    assert!(css.contains("sourceMappingURL"));
    assert_eq!(recorder.kinds(), vec![ReloadKind::Css]);
}

#[test]
fn test_script_change_rebundles_and_reloads() {
    let fixture = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let ctx = fixture
        .context(BuildMode::Development)
        .with_reloader(recorder.clone());
    let table = DispatchTable::from_config(&ctx.config).unwrap();

    fixture.write("src/assets/js/bundle.js", "console.log('changed');\n");
    let fired = dispatch(&ctx, &table, &[fixture.path("src/assets/js/bundle.js")]);

    assert_eq!(fired, 1);
    assert!(fixture
        .read("dist/assets/js/bundle.js")
        .contains("console.log('changed')"));
    assert_eq!(recorder.kinds(), vec![ReloadKind::Full]);
}

#[test]
fn test_failing_rule_keeps_watching() {
    let fixture = Fixture::new();
    let recorder = Arc::new(Recorder::default());
    let ctx = fixture
        .context(BuildMode::Development)
        .with_reloader(recorder.clone());
    let table = DispatchTable::from_config(&ctx.config).unwrap();

    fixture.write("src/assets/scss/bundle.scss", "body { color: $missing; }\n");
    let fired = dispatch(&ctx, &table, &[fixture.path("src/assets/scss/bundle.scss")]);
    assert_eq!(fired, 1);
    assert!(recorder.kinds().is_empty());

    // The next change is still handled
    let fired = dispatch(&ctx, &table, &[fixture.path("src/index.html")]);
    assert_eq!(fired, 1);
    assert!(fixture.path("dist/index.html").is_file());
    assert_eq!(recorder.kinds(), vec![ReloadKind::Full]);
}

#[test]
fn test_unrelated_change_is_ignored() {
    let fixture = Fixture::new();
    let ctx = fixture.context(BuildMode::Development);
    let table = DispatchTable::from_config(&ctx.config).unwrap();

    assert_eq!(dispatch(&ctx, &table, &[fixture.path("README.md")]), 0);
    assert!(!fixture.path("dist").exists());
}

#[test]
fn test_watch_roots_exist() {
    let fixture = Fixture::new();
    let table = DispatchTable::from_config(&fixture.config()).unwrap();
    let roots = table.watch_roots(fixture.root());

    // src contains every other base
    assert_eq!(roots, vec![fixture.path("src")]);
}

#[test]
fn test_edit_on_disk_is_picked_up_by_watcher() {
    let fixture = Fixture::new();
    let ctx = fixture.context(BuildMode::Development).with_port(0);
    execute(&resolve("build", &ctx.config).unwrap(), &ctx).unwrap();

    let (tx, rx) = mpsc::channel();
    let stop = tx.clone();
    let worker = thread::spawn(move || run_until(&ctx, tx, rx));

    // No message is sent by hand: only the file-system watcher can trigger this
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut rebuilt = false;
    let mut generation = 0;
    while !rebuilt && Instant::now() < deadline {
        generation += 1;
        fixture.write(
            "src/assets/scss/parts/_colors.scss",
            &format!("$ink: #333333;\n.changed {{ z-index: {}; }}\n", generation),
        );
        for _ in 0..10 {
            thread::sleep(Duration::from_millis(50));
            if fixture.read("dist/assets/css/bundle.css").contains(".changed") {
                rebuilt = true;
                break;
            }
        }
    }

    stop.send(WatchMessage::Shutdown).unwrap();
    worker.join().unwrap().unwrap();
    assert!(rebuilt, "watcher never rebuilt the style sheet");
}
