//! Filesystem watcher driving automatic registry refreshes
//!
//! Watches the elements directory for changes and re-runs the registry
//! build after a quiet period. The registry core is synchronous, so the
//! watcher serializes refreshes through a mutex on its own worker thread;
//! readers holding the same mutex observe either the previous or the next
//! complete map, never an intermediate state.

use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

use crate::registry::ElementRegistry;

/// Errors that can occur while setting up the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Failed to initialize watcher: {0}")]
    Init(#[source] notify::Error),

    #[error("Failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Configuration for the refresh watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Quiet period after the last filesystem event before refreshing
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }
}

enum WatchSignal {
    Changed,
    Shutdown,
}

/// Watches a registry's elements directory and refreshes it on changes
pub struct ElementWatcher {
    registry: Arc<Mutex<ElementRegistry>>,
    _watcher: RecommendedWatcher,
    signal_tx: Sender<WatchSignal>,
    worker: Option<JoinHandle<()>>,
}

impl ElementWatcher {
    /// Start watching the registry's elements directory.
    ///
    /// The registry has already been built by its constructor; the watcher
    /// only triggers re-builds. A missing directory leaves the watcher
    /// idle rather than failing.
    pub fn start(
        registry: Arc<Mutex<ElementRegistry>>,
        config: WatcherConfig,
    ) -> Result<Self, WatcherError> {
        let dir = lock_registry(&registry).elements_dir().to_path_buf();

        let (signal_tx, signal_rx) = mpsc::channel();
        let event_tx = signal_tx.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    if is_mutation(&event) {
                        let _ = event_tx.send(WatchSignal::Changed);
                    }
                }
            })
            .map_err(WatcherError::Init)?;

        if dir.is_dir() {
            watcher
                .watch(&dir, RecursiveMode::Recursive)
                .map_err(|source| WatcherError::Watch {
                    path: dir.clone(),
                    source,
                })?;
            tracing::info!(dir = %dir.display(), "Watching elements directory");
        } else {
            tracing::warn!(dir = %dir.display(), "Elements directory does not exist, watcher idle");
        }

        let worker_registry = Arc::clone(&registry);
        let debounce = config.debounce;
        let worker = thread::spawn(move || {
            let mut dirty = false;
            loop {
                match signal_rx.recv_timeout(debounce) {
                    Ok(WatchSignal::Changed) => dirty = true,
                    Ok(WatchSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                        tracing::info!("Element watcher shutting down");
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if dirty {
                            dirty = false;
                            let outcome = lock_registry(&worker_registry).refresh();
                            tracing::info!(
                                found = outcome.found,
                                skipped = outcome.skipped,
                                "Elements refreshed after filesystem change"
                            );
                        }
                    }
                }
            }
        });

        Ok(Self {
            registry,
            _watcher: watcher,
            signal_tx,
            worker: Some(worker),
        })
    }

    /// The shared registry this watcher refreshes
    pub fn registry(&self) -> &Arc<Mutex<ElementRegistry>> {
        &self.registry
    }

    /// Stop the watcher and join its worker thread
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.signal_tx.send(WatchSignal::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ElementWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Access events cannot change the scan outcome; everything else can,
/// including the unclassified `Any`/`Other` kinds some backends emit.
fn is_mutation(event: &Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
}

/// Lock the shared registry, recovering the guard if a previous holder
/// panicked mid-refresh.
fn lock_registry(registry: &Arc<Mutex<ElementRegistry>>) -> MutexGuard<'_, ElementRegistry> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
