//! Run command implementation

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use fileinstall_core::PropertyContext;
use tracing::{info, warn};

use crate::context;
use crate::error::{CliError, Result};
use crate::pipeline::LoggingPipeline;

/// Start monitoring and block until Ctrl-C, or until `exit_after` elapses.
pub fn run_monitor(properties: &PropertyContext, json: bool, exit_after: Option<Duration>) -> Result<()> {
    let (service, host) = context::service(properties)?;
    if !service.has_configurations() {
        return Err(CliError::user(
            "No directories configured (use --dir or set fileinstall.dir)",
        ));
    }

    let (shutdown, shutdown_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = shutdown.send(());
    })?;

    service.start(Arc::new(LoggingPipeline::new(json)), &host)?;
    for scheme in service.schemes() {
        info!(scheme = %scheme, "Monitoring");
    }

    match exit_after {
        Some(limit) => match shutdown_rx.recv_timeout(limit) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => warn!("Signal handler went away"),
        },
        None => {
            if shutdown_rx.recv().is_err() {
                warn!("Signal handler went away");
            }
        }
    }

    info!("Shutting down");
    service.stop();
    Ok(())
}
