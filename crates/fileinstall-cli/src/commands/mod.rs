//! Command implementations for fileinstall-cli

pub mod run;
pub mod scan;
pub mod scheme;

pub use run::run_monitor;
pub use scan::run_scan;
pub use scheme::run_scheme;
