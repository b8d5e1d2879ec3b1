//! Polling monitor for one directory tree
//!
//! Each [`DirectoryMonitor`] runs its own thread that lists the tree on a
//! fixed interval, diffs the listing against the previous one and forwards
//! the changes to its [`Installer`]. Ticks of one monitor never overlap.

use crate::config::{DEFAULT_SCAN_INTERVAL, ScanConfiguration};
use crate::installer::Installer;
use crate::snapshot::{self, DirectorySnapshot, FileChange};
use crate::{Error, Result};
use fileinstall_fs::{NormalizedPath, io};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a monitor scans its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub recursive: bool,
    /// Create the root at start when it is missing
    pub auto_create: bool,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SCAN_INTERVAL,
            recursive: true,
            auto_create: false,
        }
    }
}

impl MonitorOptions {
    pub fn for_configuration(config: &ScanConfiguration, auto_create: bool) -> Self {
        Self {
            interval: config.interval(),
            recursive: config.recursive,
            auto_create,
        }
    }
}

/// Create `root` and its parents.
///
/// Failure is logged and reported as `false`; monitoring a missing directory
/// is allowed and picks the directory up once it appears.
pub fn ensure_root(root: &NormalizedPath) -> bool {
    if root.is_dir() {
        return true;
    }
    match io::ensure_dir(root) {
        Ok(()) => {
            debug!(directory = %root, "Created monitored directory");
            true
        }
        Err(e) => {
            warn!(directory = %root, error = %e, "Could not create directory to monitor");
            false
        }
    }
}

/// Snapshot state of one monitor; only ever touched under its mutex.
struct Scanner {
    root: NormalizedPath,
    recursive: bool,
    installer: Arc<Installer>,
    snapshot: DirectorySnapshot,
}

impl Scanner {
    fn tick(&mut self) -> Vec<FileChange> {
        let outcome = match snapshot::capture(&self.root, self.recursive) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(directory = %self.root, error = %e, "Skipping scan");
                return Vec::new();
            }
        };

        let mut next = outcome.snapshot;
        for unreadable in &outcome.unreadable {
            next.carry_over(&self.snapshot, unreadable);
        }

        let mut emitted = Vec::new();
        for change in snapshot::diff(&self.snapshot, &next) {
            match self.installer.apply(&change) {
                Ok(()) => emitted.push(change),
                Err(e) => {
                    warn!(
                        directory = %self.root,
                        file = %change.path,
                        error = %e,
                        "Could not read {} file, retrying on next scan",
                        change.kind
                    );
                    next.revert(&self.snapshot, &change.path);
                }
            }
        }

        self.snapshot = next;
        emitted
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Watches one directory tree by polling.
pub struct DirectoryMonitor {
    root: NormalizedPath,
    options: MonitorOptions,
    installer: Arc<Installer>,
    scanner: Arc<Mutex<Scanner>>,
    worker: Option<Worker>,
}

impl DirectoryMonitor {
    /// Create a stopped monitor.
    pub fn new(root: NormalizedPath, options: MonitorOptions, installer: Installer) -> Self {
        let installer = Arc::new(installer);
        let scanner = Scanner {
            root: root.clone(),
            recursive: options.recursive,
            installer: Arc::clone(&installer),
            snapshot: DirectorySnapshot::new(),
        };
        Self {
            root,
            options,
            installer,
            scanner: Arc::new(Mutex::new(scanner)),
            worker: None,
        }
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// The installer events are forwarded to.
    pub fn listener(&self) -> &Installer {
        &self.installer
    }

    pub fn options(&self) -> &MonitorOptions {
        &self.options
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Start polling on a background thread.
    ///
    /// The first scan runs immediately. Starting a running monitor is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the thread cannot be created.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        if self.options.auto_create {
            ensure_root(&self.root);
        }

        let (stop, stop_rx) = mpsc::channel::<()>();
        let scanner = Arc::clone(&self.scanner);
        let interval = self.options.interval;
        let root = self.root.clone();

        let handle = thread::Builder::new()
            .name("fileinstall-monitor".into())
            .spawn(move || {
                loop {
                    scanner.lock().unwrap_or_else(PoisonError::into_inner).tick();
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!(directory = %root, "Monitor loop finished");
            })
            .map_err(|source| Error::Spawn {
                path: self.root.to_native(),
                source,
            })?;

        info!(
            directory = %self.root,
            scheme = %self.installer.scheme(),
            interval_ms = interval.as_millis() as u64,
            "Started monitor"
        );
        self.worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Run one scan on the calling thread and return the forwarded changes.
    ///
    /// Waits for a tick in progress on the background thread, if any.
    pub fn poll(&self) -> Vec<FileChange> {
        self.scanner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick()
    }

    /// Stop polling and wait for the loop to exit.
    ///
    /// A scan in progress runs to completion. Stopping a stopped monitor is a
    /// no-op.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        // The loop may already be gone; a failed send is fine
        let _ = worker.stop.send(());
        if worker.handle.join().is_err() {
            warn!(directory = %self.root, "Monitor thread panicked");
        }
        info!(directory = %self.root, "Stopped monitor");
    }

    /// Number of files in the current snapshot.
    pub fn tracked_files(&self) -> usize {
        self.scanner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .len()
    }
}

impl Drop for DirectoryMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for DirectoryMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryMonitor")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("running", &self.is_running())
            .finish()
    }
}
