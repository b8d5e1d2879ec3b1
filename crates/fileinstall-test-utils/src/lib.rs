//! Shared test utilities for the fileinstall workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`dir`]: [`TestDir`] builder for monitored directory contents
//! - [`pipeline`]: [`RecordingPipeline`] capturing every pipeline call

pub mod dir;
pub mod pipeline;

pub use dir::TestDir;
pub use pipeline::{PipelineEvent, RecordingPipeline};
