//! Scheme command implementation

use std::path::Path;

use fileinstall_core::scheme::{relocatable_key, scheme_for, scheme_hash};
use fileinstall_core::HostSettings;
use fileinstall_fs::path::canonicalize_lenient;

use crate::error::Result;

/// Print the scheme a monitor for `dir` would own.
///
/// With `--verbose` the key the token was derived from is printed too.
pub fn run_scheme(dir: &Path, home: Option<&Path>, verbose: bool) -> Result<()> {
    let settings = HostSettings {
        home_path: home.map(Path::to_path_buf),
    };
    let canonical = canonicalize_lenient(dir);

    println!("{}", scheme_for(&scheme_hash(&canonical, &settings)));
    if verbose {
        eprintln!("key: {}", relocatable_key(&canonical, &settings).to_string_lossy());
    }
    Ok(())
}
