//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Install the global subscriber.
///
/// `RUST_LOG` is honoured; `--verbose` forces debug output for the
/// fileinstall crates. Logs go to stderr so stdout stays machine readable.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info,fileinstall_core=debug,fileinstall_fs=debug,fileinstall=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let layer = fmt::layer().compact().with_target(verbose).with_writer(std::io::stderr);

    // A subscriber may already be set when embedded in tests
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
