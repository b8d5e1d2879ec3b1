//! Reference scenarios of the reconciler, driven through running monitors.

use fileinstall_core::{
    Attributes, FileInstaller, HostSettings, ResourceType, ScanConfiguration, UpdateHandler, UpdateResult,
};
use fileinstall_test_utils::{PipelineEvent, RecordingPipeline, TestDir};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

fn has(events: &[PipelineEvent], kind: &str, id: &str) -> bool {
    events.iter().any(|e| e.kind() == kind && e.id() == id)
}

#[test]
fn dropped_config_file_is_added_within_one_interval() {
    let dir = TestDir::new();
    let pipeline = Arc::new(RecordingPipeline::new());
    let service = FileInstaller::new(
        vec![ScanConfiguration::new(dir.root()).with_interval(Duration::from_millis(500))],
        false,
        false,
    );
    service.start(pipeline.clone(), &HostSettings::default()).unwrap();

    dir.write("a.cfg.json", r#"{"x":1}"#);
    assert!(pipeline.wait_for(WAIT, |events| has(events, "added", "a")));
    service.stop();

    let events = pipeline.events();
    let added = events.iter().find(|e| e.kind() == "added").unwrap();
    assert_eq!(added.resource().unwrap().resource_type, ResourceType::Config);
    assert_eq!(added.dictionary(), Some(json!({"x": 1})));
}

#[test]
fn properties_update_moves_to_canonical_extension() {
    let dir = TestDir::new();
    dir.write("a.properties", "y=1");
    let service = FileInstaller::new(vec![ScanConfiguration::new(dir.root())], true, false);
    let path = fileinstall_fs::NormalizedPath::new(dir.root());

    let result = service.handle_update(
        ResourceType::Config,
        "a",
        Some(&format!("fileinstall:ab12:{path}/a.properties")),
        &json!({"y": 2}).as_object().cloned().unwrap(),
        &Attributes::new(),
    );

    assert_eq!(
        result,
        Some(UpdateResult {
            url: format!("fileinstall:ab12:{path}/a.cfg.json"),
            moved: true
        })
    );
    dir.assert_file_not_exists("a.properties");
    dir.assert_file_contains("a.cfg.json", "\"y\": 2");
}

#[test]
fn removal_of_missing_file_is_acknowledged() {
    let dir = TestDir::new();
    let service = FileInstaller::new(vec![ScanConfiguration::new(dir.root())], true, false);
    let url = format!("fileinstall:ab12:{}/missing.cfg.json", dir.root().display());

    let result = service.handle_removal(ResourceType::Config, "missing", &url).unwrap();

    assert!(!result.moved);
    assert_eq!(result.url, fileinstall_core::ResourceUrl::parse(&url).unwrap().to_string());
}

#[test]
fn write_back_is_picked_up_by_running_monitor() {
    let dir = TestDir::new();
    dir.write("svc.cfg.json", r#"{"v": 1}"#);
    let pipeline = Arc::new(RecordingPipeline::new());
    let service = FileInstaller::new(
        vec![ScanConfiguration::new(dir.root()).with_interval(Duration::from_millis(50))],
        true,
        false,
    );
    service.start(pipeline.clone(), &HostSettings::default()).unwrap();
    assert!(pipeline.wait_for(WAIT, |events| has(events, "added", "svc")));

    let url = pipeline.events()[0].resource().unwrap().url();
    let result = service
        .handle_update(
            ResourceType::Config,
            "svc",
            Some(&url),
            &json!({"v": 2, "extra": "yes"}).as_object().cloned().unwrap(),
            &Attributes::new(),
        )
        .unwrap();
    assert_eq!(result.url, url);

    let seen = pipeline.wait_for(WAIT, |events| {
        events
            .iter()
            .any(|e| e.kind() == "updated" && e.dictionary() == Some(json!({"v": 2, "extra": "yes"})))
    });
    service.stop();
    assert!(seen, "update never observed: {:?}", pipeline.summary());
}

#[test]
fn removal_through_handler_is_seen_as_remove_event() {
    let dir = TestDir::new();
    dir.write("old.cfg", "a=b");
    let pipeline = Arc::new(RecordingPipeline::new());
    let service = FileInstaller::new(
        vec![ScanConfiguration::new(dir.root()).with_interval(Duration::from_millis(50))],
        true,
        false,
    );
    service.start(pipeline.clone(), &HostSettings::default()).unwrap();
    assert!(pipeline.wait_for(WAIT, |events| has(events, "added", "old")));

    let url = pipeline.events()[0].resource().unwrap().url();
    assert!(service.handle_removal(ResourceType::Config, "old", &url).is_some());

    assert!(pipeline.wait_for(WAIT, |events| has(events, "removed", "old")));
    service.stop();
}

#[test]
fn each_directory_gets_its_own_scheme() {
    let first = TestDir::new();
    let second = TestDir::new();
    first.write("one.jar", "1");
    second.write("two.jar", "2");

    let pipeline = Arc::new(RecordingPipeline::new());
    let service = FileInstaller::new(
        vec![ScanConfiguration::new(first.root()), ScanConfiguration::new(second.root())],
        false,
        false,
    );
    service.attach(pipeline.clone(), &HostSettings::default());
    service.poll();

    let schemes = service.schemes();
    assert_eq!(schemes.len(), 2);
    assert_ne!(schemes[0], schemes[1]);

    let by_id = |id: &str| {
        pipeline
            .events()
            .iter()
            .find(|e| e.id() == id)
            .and_then(|e| e.resource().map(|r| r.scheme.clone()))
    };
    assert_eq!(by_id("one.jar").as_ref(), Some(&schemes[0]));
    assert_eq!(by_id("two.jar").as_ref(), Some(&schemes[1]));
}

#[test]
fn relocated_installations_share_schemes() {
    let a = TestDir::new();
    let b = TestDir::new();
    let scheme_under = |home: &TestDir| {
        let install = home.create_dir("install");
        let service = FileInstaller::new(vec![ScanConfiguration::new(install)], false, false);
        service.attach(Arc::new(RecordingPipeline::new()), &HostSettings::with_home(home.root()));
        service.schemes()
    };

    assert_eq!(scheme_under(&a), scheme_under(&b));
}
