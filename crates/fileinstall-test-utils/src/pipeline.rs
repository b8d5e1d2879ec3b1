//! [`RecordingPipeline`], an [`InstallPipeline`] that remembers every call.

use fileinstall_core::{InstallPipeline, InstallableResource};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// One call received by a [`RecordingPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Added(InstallableResource),
    Updated(InstallableResource),
    Removed { scheme: String, id: String, url: String },
}

impl PipelineEvent {
    pub fn id(&self) -> &str {
        match self {
            Self::Added(resource) | Self::Updated(resource) => &resource.id,
            Self::Removed { id, .. } => id,
        }
    }

    /// Short tag for compact assertions: `"added"`, `"updated"` or `"removed"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Updated(_) => "updated",
            Self::Removed { .. } => "removed",
        }
    }

    pub fn resource(&self) -> Option<&InstallableResource> {
        match self {
            Self::Added(resource) | Self::Updated(resource) => Some(resource),
            Self::Removed { .. } => None,
        }
    }

    /// Decoded configuration content as a JSON value, for configs.
    pub fn dictionary(&self) -> Option<Value> {
        self.resource()
            .and_then(|r| r.content.as_dictionary())
            .map(|dict| Value::Object(dict.clone()))
    }
}

/// Pipeline double recording calls in arrival order.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PipelineEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.lock().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<PipelineEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// `(kind, id)` pairs of the recorded events.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.lock()
            .iter()
            .map(|event| (event.kind(), event.id().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until `predicate` holds for the recorded events.
    ///
    /// Returns `false` if it still does not hold after `timeout`.
    pub fn wait_for<F>(&self, timeout: Duration, predicate: F) -> bool
    where
        F: Fn(&[PipelineEvent]) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if predicate(&self.lock()) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl InstallPipeline for RecordingPipeline {
    fn added(&self, resource: InstallableResource) {
        self.lock().push(PipelineEvent::Added(resource));
    }

    fn updated(&self, resource: InstallableResource) {
        self.lock().push(PipelineEvent::Updated(resource));
    }

    fn removed(&self, scheme: &str, id: &str, url: &str) {
        self.lock().push(PipelineEvent::Removed {
            scheme: scheme.to_string(),
            id: id.to_string(),
            url: url.to_string(),
        });
    }
}
