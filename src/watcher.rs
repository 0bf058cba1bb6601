//! File watcher backing the `watch` CLI command (§5): debounces filesystem
//! events per-path over a 500 ms coalescing window, then hands the scanner a
//! batch of changed paths to reconcile.
//!
//! Uses a background thread/channel with sorted-batch draining, and calls
//! `notify-debouncer-full`'s API directly for the coalescing window.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_full::{
    new_debouncer, DebounceEventResult, Debouncer, RecommendedCache, RecommendedWatcher,
};

use crate::error::{GraphError, Result};
use crate::indexer::parser::CodeParser;

/// Coalescing window (§5: "debounces per-path with a 500 ms coalescing
/// window").
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a project root and yields batches of changed, extractor-supported
/// file paths (absolute) once their writes have settled.
pub struct FileWatcher {
    // Held only to keep the background watcher thread alive for the
    // lifetime of this value; never read directly.
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    batches: Receiver<Vec<PathBuf>>,
}

impl FileWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<Vec<PathBuf>>();

        let handler = move |result: DebounceEventResult| {
            let Ok(events) = result else {
                return;
            };
            let mut changed: BTreeSet<PathBuf> = BTreeSet::new();
            for event in events {
                for path in &event.event.paths {
                    if path.is_file() && CodeParser::is_supported(&path.to_string_lossy()) {
                        changed.insert(path.clone());
                    }
                }
            }
            if !changed.is_empty() {
                let _ = tx.send(changed.into_iter().collect());
            }
        };

        let mut debouncer = new_debouncer(DEBOUNCE, None, handler)
            .map_err(|e| GraphError::other(format!("failed to start file watcher: {e}")))?;
        debouncer
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| GraphError::other(format!("failed to watch {}: {e}", root.display())))?;

        Ok(Self {
            _debouncer: debouncer,
            batches: rx,
        })
    }

    /// Block until the next debounced batch of changed paths arrives, or
    /// return `None` once the watcher thread has shut down.
    pub fn recv(&self) -> Option<Vec<PathBuf>> {
        self.batches.recv().ok()
    }
}
