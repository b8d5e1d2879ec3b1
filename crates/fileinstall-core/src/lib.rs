//! Directory polling and write-back reconciliation
//!
//! `fileinstall-core` turns the contents of watched directories into
//! installable resources for an external installation pipeline, and writes
//! configuration changes coming back from that pipeline to disk.
//!
//! # Architecture
//!
//! ```text
//!                 FileInstaller  <-- UpdateHandler calls from the pipeline
//!                /      |      \
//!   DirectoryMonitor   ...   DirectoryMonitor     (one polling thread each)
//!          |                        |
//!      Installer                Installer         (scheme owner, resource builder)
//!           \                      /
//!            +--- InstallPipeline -+
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fileinstall_core::{FileInstaller, HostSettings, ScanConfiguration};
//! use std::sync::Arc;
//!
//! let service = FileInstaller::new(vec![ScanConfiguration::new("/srv/install")], true, true);
//! service.start(Arc::new(my_pipeline), &HostSettings::default())?;
//! // ...
//! service.stop();
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod installer;
pub mod monitor;
pub mod pipeline;
pub mod resource;
pub mod scheme;
pub mod serializer;
pub mod service;
pub mod snapshot;

pub use config::{HostSettings, PropertyContext, ScanConfiguration, ServiceSettings};
pub use error::{Error, Result};
pub use installer::Installer;
pub use monitor::{DirectoryMonitor, MonitorOptions};
pub use pipeline::{Attributes, InstallPipeline, UpdateHandler};
pub use resource::{
    CONFIG_FILE_EXTENSION, ConfigFormat, Dictionary, FileKind, InstallableResource, ResourceContent,
    ResourceType, UpdateResult,
};
pub use scheme::{ResourceUrl, SCHEME_PREFIX};
pub use serializer::{ConfigSerializer, JsonConfigSerializer};
pub use service::FileInstaller;
pub use snapshot::{ChangeKind, DirectorySnapshot, FileChange, Fingerprint};
