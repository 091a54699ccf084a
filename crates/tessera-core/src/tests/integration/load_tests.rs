#![cfg(test)]

use std::sync::{Arc, Mutex};

use super::common::{EventLog, ScriptedUi, TestHost, artifact, libraries};
use crate::plugin_system::dependency::RejectReason;
use crate::plugin_system::orchestrator::PluginOrchestrator;
use crate::plugin_system::traits::HostEvent;
use crate::ui_bridge::Notice;

fn events() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn start(host: &TestHost, ui: Arc<ScriptedUi>, names: &[&str], events: &EventLog) -> PluginOrchestrator {
    PluginOrchestrator::builder(host.config())
        .config_path(&host.config_path)
        .ui(ui)
        .libraries(Arc::new(libraries(names, events)))
        .plugin_override(None)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_startup_loads_every_pass_and_delivers_events() {
    let host = TestHost::new(&["editor", "geometry", "core"], vec![]);
    host.install(&artifact("core", "10").early(true).stage(-1).build());
    host.install(&artifact("geometry", "4").early(true).requires(&["core"]).build());
    host.install(&artifact("editor", "2").requires(&["geometry"]).build());
    let events = events();
    let ui = ScriptedUi::new(None);
    let mut orchestrator = start(&host, ui.clone(), &["core", "geometry", "editor"], &events);

    let outcome = orchestrator.load_plugins().await.unwrap();

    assert_eq!(outcome.loaded_names(), vec!["core", "geometry", "editor"]);
    assert!(ui.notices().is_empty());

    let frame = HostEvent::MapFrameChanged { previous: None, current: Some("main".to_string()) };
    orchestrator.notify(&frame);
    let received: Vec<String> = events.lock().unwrap().iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(received, vec!["core", "geometry", "editor"]);

    let editor = orchestrator.loader().scope_of("editor").unwrap();
    let core = orchestrator.loader().scope_of("core").unwrap();
    assert!(orchestrator.loader().graph().reaches(editor, core));
}

#[tokio::test]
async fn test_unrequested_requirement_rejects_plugin() {
    let host = TestHost::new(&["A"], vec![]);
    host.install(&artifact("A", "1").requires(&["B"]).build());
    host.install(&artifact("B", "1").build());
    let ui = ScriptedUi::new(None);
    let mut orchestrator = start(&host, ui.clone(), &["A", "B"], &events());

    let outcome = orchestrator.load_plugins().await.unwrap();

    assert!(outcome.loaded.is_empty());
    let expected = vec![("A".to_string(), RejectReason::MissingDependency(vec!["B".to_string()]))];
    assert_eq!(outcome.rejected, expected);
    assert_eq!(ui.notices(), vec![Notice::PluginsRejected(expected)]);
}

#[tokio::test]
async fn test_rejections_and_failures_do_not_stop_other_plugins() {
    let host = TestHost::new(&["future", "broken", "fine"], vec![]);
    host.install(&artifact("future", "1").min_host_version(19000).build());
    host.install(&artifact("broken", "1").build());
    host.install(&artifact("fine", "1").build());
    let ui = ScriptedUi::new(Some(true));
    // no library for "broken"
    let mut orchestrator = start(&host, ui.clone(), &["future", "fine"], &events());

    let outcome = orchestrator.load_plugins().await.unwrap();

    assert_eq!(outcome.loaded_names(), vec!["fine"]);
    assert_eq!(
        outcome.rejected,
        vec![("future".to_string(), RejectReason::VersionTooOld { required: 19000, current: 18000 })]
    );
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].plugin(), Some("broken"));

    // the confirmed disable is written back to the preferences file
    assert_eq!(host.config().plugins, vec!["future", "fine"]);
}
