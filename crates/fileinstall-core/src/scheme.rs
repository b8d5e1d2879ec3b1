//! Resource schemes and URLs
//!
//! Every monitor owns a scheme `fileinstall:<token>` where `<token>` is a
//! short digest of the monitored root. Resources are addressed as
//! `fileinstall:<token>:<path>`.

use crate::config::HostSettings;
use crate::{Error, Result};
use fileinstall_fs::{NormalizedPath, digest, path::canonicalize_lenient};
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Prefix shared by all schemes issued by this crate.
pub const SCHEME_PREFIX: &str = "fileinstall";

/// Stands in for the home path inside scheme keys.
pub const HOME_PLACEHOLDER: &str = "${fileinstall.home}";

/// Build the scheme string for a token.
pub fn scheme_for(token: &str) -> String {
    format!("{SCHEME_PREFIX}:{token}")
}

/// The key a root directory is hashed under.
///
/// When `root` lies strictly below the configured home path, the home prefix
/// is replaced by [`HOME_PLACEHOLDER`], so two installations that differ only
/// in where they live derive the same scheme.
pub fn relocatable_key(root: &Path, settings: &HostSettings) -> OsString {
    if let Some(home) = &settings.home_path {
        let home = canonicalize_lenient(home);
        if let Ok(rest) = root.strip_prefix(&home)
            && rest.components().next().is_some()
        {
            let mut key = OsString::from(HOME_PLACEHOLDER);
            for component in rest.components() {
                key.push("/");
                key.push(component.as_os_str());
            }
            return key;
        }
    }
    root.as_os_str().to_os_string()
}

#[derive(Debug, thiserror::Error)]
enum TokenError {
    #[error("key is not valid UTF-8")]
    NotUtf8,
}

fn digest_token(value: &OsStr) -> std::result::Result<String, TokenError> {
    let text = value.to_str().ok_or(TokenError::NotUtf8)?;
    Ok(digest::md5_token(&text.replace('\\', "/")))
}

/// Hash `value` into a scheme token, never failing.
///
/// If the digest cannot be computed the raw value is used as the token.
pub fn hash_with_fallback(value: &OsStr) -> String {
    digest_token(value).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Using raw key as scheme token");
        value.to_string_lossy().into_owned()
    })
}

/// Token for a monitored root directory.
pub fn scheme_hash(root: &Path, settings: &HostSettings) -> String {
    hash_with_fallback(&relocatable_key(root, settings))
}

/// A parsed `fileinstall:<token>:<path>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceUrl {
    /// `fileinstall:<token>`
    pub scheme: String,
    pub path: NormalizedPath,
}

impl ResourceUrl {
    pub fn new(scheme: impl Into<String>, path: NormalizedPath) -> Self {
        Self {
            scheme: scheme.into(),
            path,
        }
    }

    /// Split a URL into scheme and path.
    ///
    /// The path is everything after the second colon, so drive letters and
    /// colons inside file names survive.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = || Error::InvalidUrl {
            url: url.to_string(),
        };

        let rest = url
            .strip_prefix(SCHEME_PREFIX)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(invalid)?;
        let (token, path) = rest.split_once(':').ok_or_else(invalid)?;
        if token.is_empty() || path.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            scheme: scheme_for(token),
            path: NormalizedPath::new(path),
        })
    }
}

impl std::fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parse_splits_after_token() {
        let url = ResourceUrl::parse("fileinstall:ab12:/tmp/watch/a.properties").unwrap();
        assert_eq!(url.scheme, "fileinstall:ab12");
        assert_eq!(url.path.as_str(), "/tmp/watch/a.properties");
        assert_eq!(url.to_string(), "fileinstall:ab12:/tmp/watch/a.properties");
    }

    #[test]
    fn parse_keeps_drive_letters() {
        let url = ResourceUrl::parse("fileinstall:ab12:C:\\watch\\a.cfg").unwrap();
        assert_eq!(url.path.as_str(), "C:/watch/a.cfg");
    }

    #[test]
    fn parse_rejects_foreign_and_incomplete_urls() {
        for url in ["jcr:/apps/x", "fileinstall", "fileinstall:ab12", "fileinstall::/a", "fileinstall:ab12:"] {
            assert!(ResourceUrl::parse(url).is_err(), "{url} should be rejected");
        }
    }

    #[test]
    fn home_prefix_is_substituted() {
        let temp = tempfile::tempdir().unwrap();
        let home = canonicalize_lenient(temp.path());
        let settings = HostSettings::with_home(&home);

        let key = relocatable_key(&home.join("install").join("configs"), &settings);
        assert_eq!(key, OsString::from("${fileinstall.home}/install/configs"));

        // the home itself is not below the home
        assert_eq!(relocatable_key(&home, &settings), home.as_os_str().to_os_string());
    }

    #[test]
    fn relocated_installations_share_a_token() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let home_a = canonicalize_lenient(a.path());
        let home_b = canonicalize_lenient(b.path());

        let token_a = scheme_hash(&home_a.join("install"), &HostSettings::with_home(&home_a));
        let token_b = scheme_hash(&home_b.join("install"), &HostSettings::with_home(&home_b));
        assert_eq!(token_a, token_b);
        assert_ne!(
            scheme_hash(&home_a.join("install"), &HostSettings::default()),
            scheme_hash(&home_b.join("install"), &HostSettings::default())
        );
    }

    #[test]
    fn tokens_are_stable_and_distinct() {
        let paths = ["/srv/a", "/srv/b", "/srv/a/b", "/srv/ab", "/SRV/a"];
        let settings = HostSettings::default();
        let tokens: Vec<String> = paths
            .iter()
            .map(|p| scheme_hash(&PathBuf::from(p), &settings))
            .collect();

        for (path, token) in paths.iter().zip(&tokens) {
            assert_eq!(&scheme_hash(&PathBuf::from(path), &settings), token);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
        let unique: std::collections::HashSet<_> = tokens.iter().collect();
        assert_eq!(unique.len(), tokens.len());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_key_falls_back_to_raw_value() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"/srv/\xffinstall");
        assert_eq!(hash_with_fallback(raw), raw.to_string_lossy());
    }
}
