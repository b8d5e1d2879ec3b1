//! Assembly of the property context from flags, property files and the
//! environment.

use crate::cli::DirectoryArgs;
use crate::error::Result;
use fileinstall_core::config::{KEY_AUTOCREATE_DIR, KEY_DIR, KEY_HOME, KEY_INTERVAL, KEY_RECURSIVE};
use fileinstall_core::{FileInstaller, HostSettings, PropertyContext};
use fileinstall_fs::{ConfigStore, NormalizedPath};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything global that feeds property resolution.
#[derive(Debug, Default)]
pub struct Sources<'a> {
    pub config_file: Option<&'a Path>,
    pub properties: &'a [(String, String)],
}

/// Per-command flags that translate into property overrides.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub directories: Option<&'a DirectoryArgs>,
    pub interval: Option<u64>,
    pub autocreate: bool,
}

/// Build the context: explicit flags and `--set` become overrides, the
/// property file is the scoped layer, the process environment the fallback.
pub fn build(sources: &Sources<'_>, overrides: &Overrides<'_>) -> Result<PropertyContext> {
    let mut context = PropertyContext::from_env();

    if let Some(path) = sources.config_file {
        let scoped = ConfigStore::new().load(&NormalizedPath::new(path))?;
        debug!(path = %path.display(), keys = scoped.len(), "Loaded property file");
        context = context.with_scoped(scoped);
    }

    for (key, value) in sources.properties {
        context = context.with_override(key.clone(), value.clone());
    }

    if let Some(args) = overrides.directories {
        if !args.dirs.is_empty() {
            context = context.with_override(KEY_DIR, join_dirs(&args.dirs));
        }
        if args.flat {
            context = context.with_override(KEY_RECURSIVE, "false");
        }
        if let Some(home) = &args.home {
            context = context.with_override(KEY_HOME, home.to_string_lossy());
        }
    }
    if let Some(interval) = overrides.interval {
        context = context.with_override(KEY_INTERVAL, interval.to_string());
    }
    if overrides.autocreate {
        context = context.with_override(KEY_AUTOCREATE_DIR, "true");
    }

    Ok(context)
}

fn join_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|dir| dir.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the service and host settings described by `context`.
pub fn service(context: &PropertyContext) -> Result<(FileInstaller, HostSettings)> {
    Ok(FileInstaller::from_properties(context)?)
}
