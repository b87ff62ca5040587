//! Config watcher for the dev server.
//!
//! Pages and fragments are composed per request, so edits to them need no
//! action here beyond a log line. Only `stitch.toml` has state to refresh: it
//! is re-read and swapped into the global config.
//!
//! ```text
//!  notify events ──▶ Debouncer (300ms) ──▶ handle_changes()
//!                                              ├── stitch.toml  → reload_config()
//!                                              └── components/  → log
//! ```

use crate::{
    build::COMPONENTS_DIR,
    config::{SiteConfig, cfg, reload_config},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Config,
    Component,
    Other,
}

fn categorize(path: &Path, config: &SiteConfig) -> Change {
    if path == config.config_path {
        Change::Config
    } else if path.starts_with(config.get_root().join(COMPONENTS_DIR)) {
        Change::Component
    } else {
        Change::Other
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Batches rapid file events.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        self.add_paths(event.paths);
    }

    fn add_paths(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        self.pending
            .extend(paths.into_iter().filter(|path| !is_temp_file(path)));
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

fn handle_changes(paths: &[PathBuf], config: &SiteConfig) {
    let root = config.get_root();
    let mut config_changed = false;
    let mut components = Vec::new();

    for path in paths {
        match categorize(path, config) {
            Change::Config => config_changed = true,
            Change::Component => {
                components.push(path.strip_prefix(root).unwrap_or(path).display().to_string());
            }
            Change::Other => {}
        }
    }

    if !components.is_empty() {
        components.sort();
        log!("watch"; "{} changed, picked up on next request", components.join(", "));
    }

    if config_changed {
        match reload_config() {
            Ok(true) => log!("watch"; "config reloaded"),
            Ok(false) => {}
            Err(e) => log!("error"; "config reload failed, keeping previous: {e:#}"),
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    // editors often replace the file, so watch its directory
    let config_dir = config.config_path.parent().unwrap_or(config.get_root());
    watcher
        .watch(config_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", config_dir.display()))?;

    let components = config.get_root().join(COMPONENTS_DIR);
    if components.is_dir() {
        watcher
            .watch(&components, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", components.display()))?;
    }
    Ok(())
}

/// Start blocking config watcher with debouncing.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &config)?;
    log!("watch"; "watching {}", config.config_path.display());

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take(), &cfg());
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
