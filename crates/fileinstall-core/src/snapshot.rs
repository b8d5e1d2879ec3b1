//! Directory snapshots and the change computation between two of them

use crate::{Error, Result};
use fileinstall_fs::NormalizedPath;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::time::SystemTime;
use walkdir::WalkDir;

/// Lightweight change-detection signature of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl Fingerprint {
    pub fn of(metadata: &Metadata) -> Self {
        Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        }
    }
}

/// Relative path (forward slashes) -> fingerprint, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: BTreeMap<String, Fingerprint>,
}

impl DirectorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, fingerprint: Fingerprint) {
        self.entries.insert(path.into(), fingerprint);
    }

    pub fn remove(&mut self, path: &str) -> Option<Fingerprint> {
        self.entries.remove(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fingerprint)> {
        self.entries.iter().map(|(path, fp)| (path.as_str(), fp))
    }

    /// Restore `path` to its state in `previous`: re-insert the old
    /// fingerprint, or drop the entry if `previous` did not know it.
    pub fn revert(&mut self, previous: &DirectorySnapshot, path: &str) {
        match previous.get(path) {
            Some(fp) => self.insert(path, *fp),
            None => {
                self.remove(path);
            }
        }
    }

    /// Copy every entry of `previous` at or below `prefix` into this snapshot.
    ///
    /// Used for parts of the tree that could not be read this time.
    pub fn carry_over(&mut self, previous: &DirectorySnapshot, prefix: &str) {
        let nested = format!("{prefix}/");
        for (path, fp) in previous.iter() {
            if path == prefix || path.starts_with(&nested) {
                self.entries.entry(path.to_string()).or_insert(*fp);
            }
        }
    }
}

impl FromIterator<(String, Fingerprint)> for DirectorySnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Fingerprint)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Result of listing a directory tree.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub snapshot: DirectorySnapshot,
    /// Relative paths (files or directories) that could not be read
    pub unreadable: Vec<String>,
}

/// List the eligible files below `root`.
///
/// Regular files only; names starting with `.` are skipped and hidden
/// directories are not entered. A missing root lists as empty. Entries that
/// fail for any reason other than being gone are reported as unreadable.
///
/// # Errors
///
/// Returns [`Error::Scan`] when the root exists but cannot be listed.
pub fn capture(root: &NormalizedPath, recursive: bool) -> Result<ScanOutcome> {
    let native_root = root.to_native();
    match std::fs::metadata(&native_root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(Error::Scan {
                path: native_root,
                message: "not a directory".into(),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ScanOutcome::default()),
        Err(e) => {
            return Err(Error::Scan {
                path: native_root,
                message: e.to_string(),
            });
        }
    }

    let mut outcome = ScanOutcome::default();
    let walker = WalkDir::new(&native_root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(Error::Scan {
                    path: native_root,
                    message: e.to_string(),
                });
            }
            // Dangling links and entries deleted mid-listing are simply gone
            Err(e) if e.io_error().is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound) => {
                tracing::debug!(root = %root, error = %e, "Skipping vanished entry");
                continue;
            }
            Err(e) => {
                tracing::warn!(root = %root, error = %e, "Skipping unreadable entry");
                if let Some(relative) = e.path().and_then(|p| relative_path(root, p)) {
                    outcome.unreadable.push(relative);
                }
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_path(root, entry.path()) else {
            continue;
        };

        match entry.metadata() {
            Ok(meta) => outcome.snapshot.insert(relative, Fingerprint::of(&meta)),
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), error = %e, "Skipping file without metadata");
                outcome.unreadable.push(relative);
            }
        }
    }

    Ok(outcome)
}

fn relative_path(root: &NormalizedPath, path: &std::path::Path) -> Option<String> {
    NormalizedPath::new(path).relative_to(root)
}

/// Kind of change observed for a file between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Updated => write!(f, "updated"),
            Self::Removed => write!(f, "removed"),
        }
    }
}

/// One file-level change, keyed by relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: String,
}

impl FileChange {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Changes turning `previous` into `current`, ordered by path.
pub fn diff(previous: &DirectorySnapshot, current: &DirectorySnapshot) -> Vec<FileChange> {
    let mut changes = Vec::new();
    let mut old = previous.entries.iter().peekable();
    let mut new = current.entries.iter().peekable();

    // Merge walk over two ordered maps
    loop {
        match (old.peek(), new.peek()) {
            (Some((old_path, old_fp)), Some((new_path, new_fp))) => match old_path.cmp(new_path) {
                std::cmp::Ordering::Less => {
                    changes.push(FileChange::new(ChangeKind::Removed, old_path.as_str()));
                    old.next();
                }
                std::cmp::Ordering::Greater => {
                    changes.push(FileChange::new(ChangeKind::Added, new_path.as_str()));
                    new.next();
                }
                std::cmp::Ordering::Equal => {
                    if old_fp != new_fp {
                        changes.push(FileChange::new(ChangeKind::Updated, new_path.as_str()));
                    }
                    old.next();
                    new.next();
                }
            },
            (Some((old_path, _)), None) => {
                changes.push(FileChange::new(ChangeKind::Removed, old_path.as_str()));
                old.next();
            }
            (None, Some((new_path, _))) => {
                changes.push(FileChange::new(ChangeKind::Added, new_path.as_str()));
                new.next();
            }
            (None, None) => break,
        }
    }

    changes
}
