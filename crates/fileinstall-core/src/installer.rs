//! Per-monitor translation of file changes into pipeline calls

use crate::content::decode_config;
use crate::pipeline::InstallPipeline;
use crate::resource::{FileKind, InstallableResource, ResourceContent};
use crate::scheme::scheme_for;
use crate::snapshot::{ChangeKind, FileChange};
use crate::Result;
use fileinstall_fs::{NormalizedPath, digest, io};
use std::sync::Arc;
use tracing::debug;

/// Owns the scheme of one monitored directory and registers its files with
/// the pipeline.
pub struct Installer {
    pipeline: Arc<dyn InstallPipeline>,
    root: NormalizedPath,
    scheme: String,
    priority: Option<i32>,
}

impl Installer {
    /// Create an installer for `root`.
    ///
    /// `scheme_hash` is the token from [`crate::scheme::scheme_hash`]; it is
    /// fixed for the lifetime of the installer.
    pub fn new(pipeline: Arc<dyn InstallPipeline>, root: NormalizedPath, scheme_hash: &str) -> Self {
        Self {
            pipeline,
            root,
            scheme: scheme_for(scheme_hash),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = priority;
        self
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Build the resource for the file at `relative_path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or a configuration does not decode.
    pub fn create_resource(&self, relative_path: &str) -> Result<InstallableResource> {
        let path = self.root.join(relative_path);
        let kind = FileKind::from_path(&path);
        let bytes = io::read_bytes(&path)?;
        let digest = digest::content_digest(&bytes);

        let content = match kind {
            FileKind::Config(format) => {
                ResourceContent::Dictionary(decode_config(format, &bytes, &path.to_native())?)
            }
            FileKind::Bundle => ResourceContent::Bytes(bytes),
        };

        Ok(InstallableResource {
            id: kind.resource_id(relative_path),
            resource_type: kind.resource_type(),
            scheme: self.scheme.clone(),
            path,
            content,
            digest,
            priority: self.priority,
        })
    }

    /// Forward one file change to the pipeline.
    ///
    /// Removals cannot fail. An error for an add or update means nothing was
    /// sent and the change should be retried on a later tick.
    pub fn apply(&self, change: &FileChange) -> Result<()> {
        match change.kind {
            ChangeKind::Added => {
                let resource = self.create_resource(&change.path)?;
                debug!(scheme = %self.scheme, id = %resource.id, "Adding {}", resource.resource_type);
                self.pipeline.added(resource);
            }
            ChangeKind::Updated => {
                let resource = self.create_resource(&change.path)?;
                debug!(scheme = %self.scheme, id = %resource.id, "Updating {}", resource.resource_type);
                self.pipeline.updated(resource);
            }
            ChangeKind::Removed => {
                let path = self.root.join(&change.path);
                let id = FileKind::from_path(&path).resource_id(&change.path);
                let url = format!("{}:{}", self.scheme, path);
                debug!(scheme = %self.scheme, id = %id, "Removing resource");
                self.pipeline.removed(&self.scheme, &id, &url);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("root", &self.root)
            .field("scheme", &self.scheme)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
