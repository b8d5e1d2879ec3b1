//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// Canonicalize `path`, falling back to its absolute form when it cannot be
/// resolved (usually because it does not exist yet).
pub fn canonicalize_lenient(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    dunce::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// A path normalized to use forward slashes internally.
///
/// Resource URLs and identifiers are built from the string form, so every
/// path that ends up in a URL goes through this type first. Conversion back
/// to a platform-native path happens only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    /// Resolve the canonical form of a directory or file.
    ///
    /// Symlinks and `..` segments are resolved when the path exists. A path
    /// that does not exist (yet) is made absolute against the current
    /// directory instead, so callers always get a usable value.
    pub fn canonical(path: impl AsRef<Path>) -> Self {
        Self::new(canonicalize_lenient(path))
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let segment_normalized = segment_normalized.trim_start_matches('/');
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Dot-files are never treated as resources.
    pub fn is_hidden(&self) -> bool {
        self.file_name().is_some_and(|name| name.starts_with('.'))
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Whether the file name ends with the given (possibly multi-part) suffix.
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.file_name().is_some_and(|name| name.len() > suffix.len() && name.ends_with(suffix))
    }

    /// Path of this entry relative to `root`, using forward slashes.
    ///
    /// Returns `None` when the path is not below `root`.
    pub fn relative_to(&self, root: &NormalizedPath) -> Option<String> {
        let root = root.inner.trim_end_matches('/');
        let rest = self.inner.strip_prefix(root)?;
        let rest = rest.strip_prefix('/')?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }

    /// Replace the last extension of the file name with `suffix`.
    ///
    /// Only a dot inside the file name counts: a dot in a directory name or a
    /// leading dot of the file name causes `suffix` to be appended instead.
    /// `suffix` includes its leading dot, e.g. `".cfg.json"`.
    pub fn with_suffix_replaced(&self, suffix: &str) -> Self {
        let last_slash = self.inner.rfind('/').map(|i| i as isize).unwrap_or(-1);
        let replaced = match self.inner.rfind('.') {
            Some(dot) if dot as isize > last_slash + 1 => {
                format!("{}{}", &self.inner[..dot], suffix)
            }
            _ => format!("{}{}", self.inner, suffix),
        };
        Self { inner: replaced }
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
