//! Atomic I/O operations with file locking

use crate::{Error, NormalizedPath, Result};
use backoff::ExponentialBackoff;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Tuning knobs for [`write_atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to keep retrying when another writer holds the lock.
    pub lock_timeout: Duration,
    /// Flush the temp file to stable storage before the rename.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            enable_fsync: true,
        }
    }
}

/// Hidden sibling used as the advisory lock for `target`.
fn lock_path(target: &Path) -> PathBuf {
    sibling(target, "lock")
}

fn sibling(target: &Path, tag: &str) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}", name, tag))
}

/// Unique per write so concurrent writers never share a temp file.
fn temp_path(target: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let seq = NEXT.fetch_add(1, Ordering::Relaxed);
    sibling(target, &format!("{}.{}.tmp", std::process::id(), seq))
}

fn acquire_lock(target: &Path, timeout: Duration) -> Result<File> {
    let path = lock_path(target);
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(10),
        max_interval: Duration::from_millis(200),
        max_elapsed_time: Some(timeout),
        ..ExponentialBackoff::default()
    };

    backoff::retry(policy, || {
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(backoff::Error::permanent)?;
        lock_file.try_lock_exclusive().map_err(|e| {
            debug!(path = %path.display(), "Lock busy, retrying");
            backoff::Error::transient(e)
        })?;
        // The previous holder unlinks the lock file when it is done
        if !path.exists() {
            let _ = lock_file.unlock();
            return Err(backoff::Error::transient(std::io::Error::other("lock file removed")));
        }
        Ok(lock_file)
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => Error::io(&path, err),
        backoff::Error::Transient { .. } => Error::LockFailed {
            path: target.to_path_buf(),
        },
    })
}

fn release_lock(target: &Path, lock: File) {
    let path = lock_path(target);
    if let Err(e) = fs::remove_file(&path)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        debug!(path = %path.display(), error = %e, "Lock file left in place");
    }
    if let Err(e) = lock.unlock() {
        warn!(path = %target.display(), error = %e, "Failed to release write lock");
    }
}

/// Write a file atomically, producing its content through a buffered writer.
///
/// The content goes to a hidden temp file in the same directory which is
/// renamed over the target once `fill` succeeds, so readers see either the
/// old or the new content. Parent directories are created as needed and an
/// advisory lock serializes concurrent writers of the same target. The lock
/// file is removed again before returning.
pub fn write_atomic_with<F>(path: &NormalizedPath, config: RobustnessConfig, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let lock = acquire_lock(&native_path, config.lock_timeout)?;

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = temp_path(&native_path);

    let result = write_temp(&temp_path, config, fill)
        .and_then(|()| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    release_lock(&native_path, lock);

    result
}

fn write_temp<F>(temp_path: &Path, config: RobustnessConfig, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    let mut writer = BufWriter::new(temp_file);
    fill(&mut writer).map_err(|e| Error::io(temp_path, e))?;
    writer.flush().map_err(|e| Error::io(temp_path, e))?;

    if config.enable_fsync {
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| Error::io(temp_path, e))?;
    }
    Ok(())
}

/// Write content atomically to a file with locking.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    write_atomic_with(path, config, |w| w.write_all(content))
}

/// Read the raw bytes of a file.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Delete a file, treating an already missing file as success.
///
/// A lock file left next to it by an interrupted write goes too. Returns
/// whether the file itself was actually removed.
pub fn remove_if_exists(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    let removed = match fs::remove_file(&native_path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    let lock = lock_path(&native_path);
    if let Err(e) = fs::remove_file(&lock)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        debug!(path = %lock.display(), error = %e, "Stale lock file left in place");
    }
    Ok(removed)
}

/// Create a directory and all of its parents.
pub fn ensure_dir(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    fs::create_dir_all(&native_path).map_err(|e| Error::io(&native_path, e))
}
