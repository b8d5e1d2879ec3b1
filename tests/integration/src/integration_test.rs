//! End-to-end integration test for the vertical slice
//!
//! This test exercises the complete flow: property file -> service -> poll ->
//! write-back -> poll.

use fileinstall_core::{
    Attributes, FileInstaller, PropertyContext, ResourceType, UpdateHandler, config::KEY_DIR,
};
use fileinstall_fs::{ConfigStore, NormalizedPath};
use fileinstall_test_utils::{RecordingPipeline, TestDir};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Set up a workspace with two watched directories and a property file
/// describing them.
fn setup_workspace() -> (TestDir, NormalizedPath) {
    let dir = TestDir::new();
    dir.write("configs/app.cfg.json", "// seeded\n{\"port\": 8080}\n");
    dir.write("configs/legacy.cfg", "mode = compat\n");
    dir.write("bundles/core.jar", "binary");

    let properties = dir.write(
        "fileinstall.json",
        &serde_json::to_string_pretty(&json!({
            "fileinstall": {
                "dir": [dir.path("configs"), dir.path("bundles")],
                "interval": 250,
                "writeback": true,
                "priority": 100
            }
        }))
        .unwrap(),
    );

    (dir, NormalizedPath::new(properties))
}

#[test]
fn test_property_file_to_service() {
    let (_dir, properties) = setup_workspace();

    let scoped = ConfigStore::new().load(&properties).unwrap();
    let context = PropertyContext::new().with_scoped(scoped);
    let (service, _host) = FileInstaller::from_properties(&context).unwrap();

    assert!(service.has_configurations());
    assert!(service.writeback_enabled());
    let configs = service.configurations();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().all(|c| c.interval() == Duration::from_millis(250)));
    assert!(configs.iter().all(|c| c.priority == Some(100)));
}

#[test]
fn test_full_reconciliation_cycle() {
    let (dir, properties) = setup_workspace();
    let context = PropertyContext::new().with_scoped(ConfigStore::new().load(&properties).unwrap());
    let (service, host) = FileInstaller::from_properties(&context).unwrap();
    let pipeline = Arc::new(RecordingPipeline::new());
    service.attach(pipeline.clone(), &host);

    // Initial scan registers everything in directory order
    service.poll();
    assert_eq!(
        pipeline.summary(),
        vec![
            ("added", "app".to_string()),
            ("added", "legacy".to_string()),
            ("added", "core.jar".to_string()),
        ]
    );
    let events = pipeline.take();
    assert_eq!(events[0].dictionary(), Some(json!({"port": 8080})));
    assert_eq!(events[1].dictionary(), Some(json!({"mode": "compat"})));
    assert!(events.iter().all(|e| e.resource().unwrap().priority == Some(100)));

    // The pipeline edits the legacy configuration
    let legacy_url = events[1].resource().unwrap().url();
    let result = service
        .handle_update(
            ResourceType::Config,
            "legacy",
            Some(&legacy_url),
            &json!({"mode": "modern"}).as_object().cloned().unwrap(),
            &Attributes::new(),
        )
        .unwrap();
    assert!(result.moved);
    assert!(result.url.ends_with("/configs/legacy.cfg.json"));
    assert!(predicate::path::missing().eval(&dir.path("configs/legacy.cfg")));

    // The rename shows up as remove + add
    service.poll();
    assert_eq!(
        pipeline.summary(),
        vec![("removed", "legacy".to_string()), ("added", "legacy".to_string())]
    );
    let readded = pipeline.take().remove(1);
    assert_eq!(readded.dictionary(), Some(json!({"mode": "modern"})));
    assert_eq!(readded.resource().unwrap().url(), result.url);

    // New resources go to the first directory
    let created = service
        .handle_update(
            ResourceType::Config,
            "fresh",
            None,
            &json!({"new": true}).as_object().cloned().unwrap(),
            &Attributes::new(),
        )
        .unwrap();
    assert!(created.url.starts_with(&service.schemes()[0]));
    dir.assert_file_exists("configs/fresh.cfg.json");

    service.stop();
    assert!(service.schemes().is_empty());
}

#[test]
fn test_environment_layer_is_last_resort() {
    let dir = TestDir::new();
    let root = dir.root().to_string_lossy().into_owned();
    let context = PropertyContext::new()
        .with_env("FILEINSTALL_DIR", root.clone())
        .with_env("FILEINSTALL_WRITEBACK", "true")
        .with_override("fileinstall.writeback", "false");

    let (service, _) = FileInstaller::from_properties(&context).unwrap();

    assert_eq!(service.configurations()[0].directory, dir.root());
    assert!(!service.writeback_enabled());
    assert_eq!(fileinstall_core::config::lookup(&context, KEY_DIR), Some(root.as_str()));
}
