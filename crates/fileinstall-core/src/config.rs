//! Configuration keys and their resolution
//!
//! Every key is resolved by [`lookup`] against an explicit
//! [`PropertyContext`], checking in order:
//!
//! 1. process-level overrides (command-line flags, embedding host),
//! 2. scoped properties (a property file handed to the host),
//! 3. the environment, under the key uppercased with `.` replaced by `_`
//!    (`fileinstall.dir` -> `FILEINSTALL_DIR`).

use crate::{Error, Result};
use fileinstall_fs::Properties;
use std::path::PathBuf;
use std::time::Duration;

/// Comma separated list of directories to monitor
pub const KEY_DIR: &str = "fileinstall.dir";
/// Interval in milliseconds between two consecutive polls
pub const KEY_INTERVAL: &str = "fileinstall.interval";
/// Whether pipeline changes are written back to the monitored directories
pub const KEY_WRITEBACK: &str = "fileinstall.writeback";
/// Whether monitored directories are created at start when missing
pub const KEY_AUTOCREATE_DIR: &str = "fileinstall.dir.autocreate";
/// Whether sub-directories are scanned
pub const KEY_RECURSIVE: &str = "fileinstall.recursive";
/// Priority assigned to every produced resource
pub const KEY_PRIORITY: &str = "fileinstall.priority";
/// Installation home, replaced by a placeholder when deriving schemes
pub const KEY_HOME: &str = "fileinstall.home";

/// Poll interval used when none is configured.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(5000);

/// Sources a configuration key can be resolved from.
#[derive(Debug, Clone, Default)]
pub struct PropertyContext {
    pub overrides: Properties,
    pub scoped: Properties,
    pub environment: Properties,
}

impl PropertyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose environment layer is a snapshot of the process environment.
    pub fn from_env() -> Self {
        Self {
            environment: std::env::vars().collect(),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_scoped(mut self, properties: Properties) -> Self {
        self.scoped.extend(properties);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// Environment variable name for a dotted key.
pub fn env_key(key: &str) -> String {
    key.to_uppercase().replace('.', "_")
}

/// Resolve `key` against `context` with override > scoped > environment precedence.
pub fn lookup<'a>(context: &'a PropertyContext, key: &str) -> Option<&'a str> {
    context
        .overrides
        .get(key)
        .or_else(|| context.scoped.get(key))
        .or_else(|| context.environment.get(&env_key(key)))
        .map(String::as_str)
}

fn lookup_bool(context: &PropertyContext, key: &str, default: bool) -> Result<bool> {
    match lookup(context, key).map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
        Some(value) => Err(Error::invalid_property(key, value, "expected true or false")),
    }
}

fn lookup_parsed<T>(context: &PropertyContext, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(context, key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| Error::invalid_property(key, value, e)),
    }
}

/// One monitored directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfiguration {
    pub directory: PathBuf,
    /// `None` falls back to [`DEFAULT_SCAN_INTERVAL`]
    pub scan_interval: Option<Duration>,
    pub recursive: bool,
    pub priority: Option<i32>,
}

impl ScanConfiguration {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            scan_interval: None,
            recursive: true,
            priority: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = Some(interval);
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn interval(&self) -> Duration {
        self.scan_interval.unwrap_or(DEFAULT_SCAN_INTERVAL)
    }

    /// Build one configuration per entry of the comma separated directory list.
    ///
    /// No directory key means no configurations, which is not an error.
    pub fn from_properties(context: &PropertyContext) -> Result<Vec<Self>> {
        let Some(dirs) = lookup(context, KEY_DIR) else {
            return Ok(Vec::new());
        };

        let interval = lookup_parsed::<u64>(context, KEY_INTERVAL)?.map(Duration::from_millis);
        let recursive = lookup_bool(context, KEY_RECURSIVE, true)?;
        let priority = lookup_parsed::<i32>(context, KEY_PRIORITY)?;

        Ok(dirs
            .split(',')
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(|dir| Self {
                directory: PathBuf::from(dir),
                scan_interval: interval,
                recursive,
                priority,
            })
            .collect())
    }
}

/// Host-provided context used to make schemes relocatable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSettings {
    pub home_path: Option<PathBuf>,
}

impl HostSettings {
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home_path: Some(home.into()),
        }
    }
}

/// Service-wide switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSettings {
    pub writeback: bool,
    pub auto_create: bool,
    pub host: HostSettings,
}

impl ServiceSettings {
    pub fn from_properties(context: &PropertyContext) -> Result<Self> {
        Ok(Self {
            writeback: lookup_bool(context, KEY_WRITEBACK, false)?,
            auto_create: lookup_bool(context, KEY_AUTOCREATE_DIR, false)?,
            host: HostSettings {
                home_path: lookup(context, KEY_HOME)
                    .map(str::trim)
                    .filter(|home| !home.is_empty())
                    .map(PathBuf::from),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn env_key_uppercases_and_replaces_dots() {
        assert_eq!(env_key(KEY_AUTOCREATE_DIR), "FILEINSTALL_DIR_AUTOCREATE");
    }

    #[test]
    fn lookup_precedence() {
        let ctx = PropertyContext::new()
            .with_env("FILEINSTALL_DIR", "/env")
            .with_scoped([(KEY_DIR.to_string(), "/scoped".to_string())].into());
        assert_eq!(lookup(&ctx, KEY_DIR), Some("/scoped"));

        let ctx = ctx.with_override(KEY_DIR, "/override");
        assert_eq!(lookup(&ctx, KEY_DIR), Some("/override"));

        let env_only = PropertyContext::new().with_env("FILEINSTALL_DIR", "/env");
        assert_eq!(lookup(&env_only, KEY_DIR), Some("/env"));
        assert_eq!(lookup(&env_only, KEY_INTERVAL), None);
    }

    #[test]
    fn environment_is_not_consulted_under_the_dotted_name() {
        let ctx = PropertyContext::new().with_env(KEY_DIR, "/dotted");
        assert_eq!(lookup(&ctx, KEY_DIR), None);
    }

    #[test]
    fn no_directories_means_no_configurations() {
        assert!(ScanConfiguration::from_properties(&PropertyContext::new()).unwrap().is_empty());
    }

    #[test]
    fn directory_list_is_split_and_trimmed() {
        let ctx = PropertyContext::new()
            .with_override(KEY_DIR, " /a , /b,,/c ")
            .with_override(KEY_INTERVAL, "500")
            .with_override(KEY_PRIORITY, "-10");

        let configs = ScanConfiguration::from_properties(&ctx).unwrap();
        let dirs: Vec<_> = configs.iter().map(|c| c.directory.clone()).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]);
        assert!(configs.iter().all(|c| c.interval() == Duration::from_millis(500)));
        assert!(configs.iter().all(|c| c.recursive && c.priority == Some(-10)));
    }

    #[test]
    fn interval_defaults_when_absent() {
        let ctx = PropertyContext::new().with_override(KEY_DIR, "/a");
        let configs = ScanConfiguration::from_properties(&ctx).unwrap();
        assert_eq!(configs[0].scan_interval, None);
        assert_eq!(configs[0].interval(), DEFAULT_SCAN_INTERVAL);
    }

    #[test]
    fn invalid_interval_is_reported() {
        let ctx = PropertyContext::new()
            .with_override(KEY_DIR, "/a")
            .with_override(KEY_INTERVAL, "soon");
        let err = ScanConfiguration::from_properties(&ctx).unwrap_err();
        assert!(matches!(err, Error::InvalidProperty { ref key, .. } if key == KEY_INTERVAL));
    }

    #[test]
    fn service_settings_booleans() {
        let ctx = PropertyContext::new()
            .with_env("FILEINSTALL_WRITEBACK", "TRUE")
            .with_override(KEY_HOME, "/opt/app");
        let settings = ServiceSettings::from_properties(&ctx).unwrap();
        assert!(settings.writeback);
        assert!(!settings.auto_create);
        assert_eq!(settings.host, HostSettings::with_home("/opt/app"));

        let bad = PropertyContext::new().with_override(KEY_AUTOCREATE_DIR, "yes");
        assert!(ServiceSettings::from_properties(&bad).is_err());
    }
}
