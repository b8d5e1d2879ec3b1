//! Contracts with the external installation pipeline
//!
//! [`InstallPipeline`] is what monitors talk to; [`UpdateHandler`] is what the
//! pipeline talks to when it wants a change persisted back to disk.

use crate::resource::{Dictionary, InstallableResource, ResourceType, UpdateResult};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;

/// Free-form attributes accompanying an update request.
pub type Attributes = HashMap<String, Value>;

/// Receiver of resource lifecycle events.
///
/// Calls arrive from monitor threads, one tick at a time per monitor but
/// concurrently across monitors.
pub trait InstallPipeline: Send + Sync {
    /// A file appeared.
    fn added(&self, resource: InstallableResource);

    /// A known file changed.
    fn updated(&self, resource: InstallableResource);

    /// A known file disappeared. `url` is the `scheme:path` it was registered under.
    fn removed(&self, scheme: &str, id: &str, url: &str);
}

/// Write-back surface offered to the pipeline.
///
/// `None` means "not handled here", which is distinct from a successful
/// no-op: the pipeline may offer the request to another handler.
pub trait UpdateHandler: Send + Sync {
    fn handle_removal(&self, resource_type: ResourceType, id: &str, url: &str) -> Option<UpdateResult>;

    fn handle_update(
        &self,
        resource_type: ResourceType,
        id: &str,
        url: Option<&str>,
        dictionary: &Dictionary,
        attributes: &Attributes,
    ) -> Option<UpdateResult>;

    /// Same as [`UpdateHandler::handle_update`] for content that is already
    /// serialized.
    fn handle_update_stream(
        &self,
        resource_type: ResourceType,
        id: &str,
        url: Option<&str>,
        content: &mut dyn Read,
        attributes: &Attributes,
    ) -> Option<UpdateResult>;
}
