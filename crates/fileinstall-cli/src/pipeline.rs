//! Pipelines used by the command-line host

use colored::Colorize;
use fileinstall_core::{InstallPipeline, InstallableResource, ResourceType};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::info;

/// One pipeline call, as printed with `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event: &'static str,
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    pub scheme: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl EventRecord {
    pub fn for_resource(event: &'static str, resource: &InstallableResource) -> Self {
        Self {
            event,
            id: resource.id.clone(),
            resource_type: Some(resource.resource_type),
            scheme: resource.scheme.clone(),
            url: resource.url(),
            digest: Some(resource.digest.clone()),
            priority: resource.priority,
        }
    }

    pub fn for_removal(scheme: &str, id: &str, url: &str) -> Self {
        Self {
            event: "removed",
            id: id.to_string(),
            resource_type: None,
            scheme: scheme.to_string(),
            url: url.to_string(),
            digest: None,
            priority: None,
        }
    }

    fn print(&self, json: bool) {
        let mut stdout = std::io::stdout().lock();
        let line = if json {
            serde_json::to_string(self).unwrap_or_default()
        } else {
            let marker = match self.event {
                "added" => "+".green(),
                "updated" => "~".yellow(),
                _ => "-".red(),
            };
            let kind = self.resource_type.map(|t| t.to_string()).unwrap_or_default();
            format!("{} {} {} {}", marker, self.id.cyan(), kind.dimmed(), self.url)
        };
        // A closed stdout must not take the monitor thread down
        let _ = writeln!(stdout, "{line}");
    }
}

/// Logs every call and echoes it on stdout.
#[derive(Debug, Default)]
pub struct LoggingPipeline {
    json: bool,
}

impl LoggingPipeline {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl InstallPipeline for LoggingPipeline {
    fn added(&self, resource: InstallableResource) {
        info!(id = %resource.id, scheme = %resource.scheme, "Registered {}", resource.resource_type);
        EventRecord::for_resource("added", &resource).print(self.json);
    }

    fn updated(&self, resource: InstallableResource) {
        info!(id = %resource.id, scheme = %resource.scheme, "Updated {}", resource.resource_type);
        EventRecord::for_resource("updated", &resource).print(self.json);
    }

    fn removed(&self, scheme: &str, id: &str, url: &str) {
        info!(id = %id, scheme = %scheme, "Removed resource");
        EventRecord::for_removal(scheme, id, url).print(self.json);
    }
}

/// Collects calls for a one-shot scan.
#[derive(Debug, Default)]
pub struct CollectingPipeline {
    records: Mutex<Vec<EventRecord>>,
}

impl CollectingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the collected records.
    pub fn take(&self) -> Vec<EventRecord> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn push(&self, record: EventRecord) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(record);
    }
}

impl InstallPipeline for CollectingPipeline {
    fn added(&self, resource: InstallableResource) {
        self.push(EventRecord::for_resource("added", &resource));
    }

    fn updated(&self, resource: InstallableResource) {
        self.push(EventRecord::for_resource("updated", &resource));
    }

    fn removed(&self, scheme: &str, id: &str, url: &str) {
        self.push(EventRecord::for_removal(scheme, id, url));
    }
}
