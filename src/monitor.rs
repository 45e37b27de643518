//! Change monitor.
//!
//! Re-runs the pricing pass whenever the products or sales file really
//! changes. File-system notifications are noisy (editors touch, truncate,
//! rename, and rewrite identical bytes), so every notification is checked
//! against the SHA-256 fingerprint recorded after the last successful pass
//! and dropped when the content is the same.
//!
//! # State machine
//!
//! ```text
//!            start: unconditional pass
//!                       │
//!                       ▼
//!   ┌──────────────▶  Idle  ──── notification for a watched file
//!   │                                   │
//!   │                                   ▼
//!   │                              Processing
//!   │                 ┌─────────────────┼──────────────────┐
//!   │          same fingerprint    pass ok          pass failed
//!   │            (suppressed)    commit both fps   state untouched
//!   └─────────────────┴─────────────────┴──────────────────┘
//! ```
//!
//! Notifications are handled one at a time by a single task; a notification
//! that arrives mid-pass waits in the channel until the pass finishes.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use pricewatch_core::{Fingerprint, PricingEngine, WatchState};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::error::PassError;
use crate::pass::{self, PassSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Processing,
}

/// Result of handling one notification (or the startup pass).
#[derive(Debug)]
pub enum ChangeOutcome {
    /// The path is not one of the watched inputs.
    Ignored,
    /// The file content matches the last processed fingerprint.
    Suppressed,
    /// A pass ran and the price list was rewritten.
    Processed(PassSummary),
    /// A pass ran and failed; nothing was committed.
    Failed(PassError),
}

pub struct Monitor {
    config: Config,
    engine: PricingEngine,
    watch_state: WatchState,
    state: MonitorState,
    watched: Vec<PathBuf>,
}

impl Monitor {
    pub fn new(config: Config) -> Self {
        let engine = config.engine();
        let watched = vec![
            resolve(&config.inputs.products),
            resolve(&config.inputs.sales),
        ];
        Self {
            config,
            engine,
            watch_state: WatchState::new(),
            state: MonitorState::Idle,
            watched,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn watch_state(&self) -> &WatchState {
        &self.watch_state
    }

    /// Resolved paths of the two watched inputs.
    pub fn watched_files(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Distinct directories that must be watched (non-recursively).
    pub fn watch_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for file in &self.watched {
            let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Run the startup pass, whether or not anything changed.
    pub fn start(&mut self) -> ChangeOutcome {
        self.transition(MonitorState::Processing);
        let outcome = self.run_and_commit();
        self.transition(MonitorState::Idle);
        outcome
    }

    /// Handle one change notification for `path`.
    pub fn handle_change(&mut self, path: &Path) -> ChangeOutcome {
        let resolved = resolve(path);
        if !self.watched.contains(&resolved) {
            return ChangeOutcome::Ignored;
        }

        self.transition(MonitorState::Processing);
        let current = fingerprint_file(&resolved);

        let outcome = if !self.watch_state.is_changed(&resolved, &current) {
            tracing::debug!(file = %resolved.display(), fingerprint = %current, "content unchanged");
            ChangeOutcome::Suppressed
        } else {
            tracing::info!(file = %resolved.display(), fingerprint = %current, "change detected");
            self.run_and_commit()
        };

        self.transition(MonitorState::Idle);
        outcome
    }

    /// Run a pass; on success record the fingerprints of both inputs as
    /// they were read before the pass started.
    fn run_and_commit(&mut self) -> ChangeOutcome {
        let fingerprints: Vec<(PathBuf, Fingerprint)> = self
            .watched
            .iter()
            .map(|p| (p.clone(), fingerprint_file(p)))
            .collect();

        match pass::run_pass(&self.config, &self.engine, false) {
            Ok(summary) => {
                for (path, fp) in fingerprints {
                    self.watch_state.commit(path, fp);
                }
                ChangeOutcome::Processed(summary)
            }
            Err(e) => ChangeOutcome::Failed(e),
        }
    }

    fn transition(&mut self, next: MonitorState) {
        tracing::trace!(from = ?self.state, to = ?next, "monitor state");
        self.state = next;
    }
}

/// Absolute form of `path` with its directory canonicalized, so that
/// configured paths and paths reported by the watcher compare equal.
fn resolve(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let dir = dir.canonicalize().unwrap_or(dir);
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    }
}

/// Fingerprint of the file's current bytes; unreadable files are "missing".
fn fingerprint_file(path: &Path) -> Fingerprint {
    match std::fs::read(path) {
        Ok(bytes) => Fingerprint::of_bytes(&bytes),
        Err(e) => {
            tracing::debug!(file = %path.display(), error = %e, "cannot read for fingerprint");
            Fingerprint::missing()
        }
    }
}

fn report(outcome: &ChangeOutcome) {
    match outcome {
        ChangeOutcome::Ignored | ChangeOutcome::Suppressed => {}
        ChangeOutcome::Processed(summary) => {
            tracing::info!(
                products = summary.products,
                floor_raised = summary.floor_raised,
                output = %summary
                    .output
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                "prices updated"
            );
        }
        ChangeOutcome::Failed(e) => {
            tracing::error!(kind = e.kind(), error = %e, "pass failed, waiting for next change");
        }
    }
}

fn is_content_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Run the monitor until Ctrl-C.
pub async fn run_monitor(config: Config) -> Result<()> {
    let settle = Duration::from_millis(config.watch.settle_ms);
    let mut monitor = Monitor::new(config);

    let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_content_event(&event.kind) => {
            for path in event.paths {
                let _ = tx.send(path);
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "watch error"),
    })
    .context("Failed to create file watcher")?;

    for dir in monitor.watch_dirs() {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;
    }

    for file in monitor.watched_files() {
        tracing::info!(file = %file.display(), "watching");
    }

    // Watching starts before the startup pass so no edit can slip between them.
    report(&monitor.start());
    eprintln!("Watching for changes. Press Ctrl+C to stop.");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl+C")?;
                tracing::info!("interrupt received, stopping");
                break;
            }
            first = rx.recv() => {
                let Some(first) = first else { break };

                // Let the rest of the burst arrive, then handle each path once.
                tokio::time::sleep(settle).await;
                let mut batch = vec![first];
                while let Ok(path) = rx.try_recv() {
                    if !batch.contains(&path) {
                        batch.push(path);
                    }
                }

                for path in batch {
                    report(&monitor.handle_change(&path));
                }
            }
        }
    }

    drop(watcher);
    eprintln!("Monitor stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PRODUCTS: &str = "sku,name,current_price,cost_price,stock\nA1,Alpha,100,50,10\n";
    const SALES: &str = "sku,quantity_sold\nA1,40\n";

    fn setup() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("products.csv"), PRODUCTS).unwrap();
        fs::write(root.join("sales.csv"), SALES).unwrap();
        let config = Config::minimal().with_overrides(
            Some(root.join("products.csv")),
            Some(root.join("sales.csv")),
            Some(root.join("updated_prices.csv")),
        );
        (dir, config)
    }

    #[test]
    fn resolve_matches_relative_and_absolute() {
        let dir = TempDir::new().unwrap();
        let abs = dir.path().join("x.csv");
        let dotted = dir.path().join(".").join("x.csv");
        assert_eq!(resolve(&abs), resolve(&dotted));
    }

    #[test]
    fn start_commits_both_fingerprints() {
        let (_dir, config) = setup();
        let mut monitor = Monitor::new(config);
        assert!(matches!(monitor.start(), ChangeOutcome::Processed(_)));
        assert_eq!(monitor.watch_state().len(), 2);
        assert_eq!(monitor.state(), MonitorState::Idle);
    }

    #[test]
    fn unrelated_file_is_ignored() {
        let (dir, config) = setup();
        let mut monitor = Monitor::new(config);
        monitor.start();
        let outcome = monitor.handle_change(&dir.path().join("updated_prices.csv"));
        assert!(matches!(outcome, ChangeOutcome::Ignored));
    }

    #[test]
    fn watch_dirs_deduplicated() {
        let (_dir, config) = setup();
        let monitor = Monitor::new(config);
        assert_eq!(monitor.watch_dirs().len(), 1);
    }

    #[test]
    fn content_events_only() {
        use notify::event::{AccessKind, CreateKind, ModifyKind};
        assert!(is_content_event(&EventKind::Create(CreateKind::File)));
        assert!(is_content_event(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_content_event(&EventKind::Access(AccessKind::Any)));
    }
}
