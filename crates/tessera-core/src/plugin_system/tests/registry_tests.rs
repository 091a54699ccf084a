#![cfg(test)]

use std::sync::{Arc, Mutex};

use super::support::{BarePlugin, DownloadOnlyPlugin, EventLog, TestPlugin, plugin};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::registry::{ModuleHandle, ModuleRegistry};
use crate::plugin_system::scope::ScopeId;
use crate::plugin_system::traits::{HostEvent, LifecycleHook};

fn handle(name: &str, events: &EventLog) -> ModuleHandle {
    ModuleHandle::new(plugin(name).build(), Arc::new(TestPlugin::new(name, events.clone())), ScopeId::HOST)
}

fn map_frame(previous: Option<&str>, current: Option<&str>) -> HostEvent {
    HostEvent::MapFrameChanged {
        previous: previous.map(str::to_string),
        current: current.map(str::to_string),
    }
}

struct HostListener(EventLog);

impl LifecycleHook for HostListener {
    fn on_event(&self, event: &HostEvent) {
        self.0.lock().unwrap().push(("host".to_string(), event.clone()));
    }
}

#[test]
fn test_register_and_lookup() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ModuleRegistry::new();
    registry.register(handle("a", &events)).unwrap();
    registry.register(handle("b", &events)).unwrap();

    assert_eq!(registry.len(), 2);
    assert!(registry.get("a").is_some());
    assert!(registry.get("c").is_none());
    let names: Vec<String> = registry.active_metadata().iter().map(|m| m.name().to_string()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_duplicate_registration_fails() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ModuleRegistry::new();
    registry.register(handle("a", &events)).unwrap();
    let err = registry.register(handle("a", &events)).unwrap_err();
    assert!(matches!(err, PluginSystemError::InternalError(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_events_reach_listeners_then_modules_in_order() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ModuleRegistry::new();
    registry.add_listener(Arc::new(HostListener(events.clone())));
    registry.register(handle("first", &events)).unwrap();
    registry.register(handle("second", &events)).unwrap();

    registry.notify(&HostEvent::PreferencesChanged);

    let received: Vec<String> = events.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(received, vec!["host", "first", "second"]);
}

#[test]
fn test_late_module_receives_current_map_frame() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ModuleRegistry::new();
    registry.register(handle("early", &events)).unwrap();
    registry.notify(&map_frame(None, Some("main")));
    registry.notify(&map_frame(Some("main"), Some("second")));
    events.lock().unwrap().clear();

    registry.register(handle("late", &events)).unwrap();

    let received = events.lock().unwrap().clone();
    assert_eq!(received, vec![("late".to_string(), map_frame(None, Some("second")))]);
}

#[test]
fn test_late_listener_receives_current_map_frame() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ModuleRegistry::new();
    registry.notify(&map_frame(None, Some("main")));
    registry.notify(&HostEvent::PreferencesChanged);

    registry.add_listener(Arc::new(HostListener(events.clone())));

    let received = events.lock().unwrap().clone();
    assert_eq!(received, vec![("host".to_string(), map_frame(None, Some("main")))]);
}

#[test]
fn test_capability_probes_tolerate_missing_capabilities() {
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ModuleRegistry::new();
    let with_prefs = TestPlugin::new("prefs", events.clone()).with_preferences();
    registry
        .register(ModuleHandle::new(plugin("prefs").build(), Arc::new(with_prefs), ScopeId::HOST))
        .unwrap();
    registry
        .register(ModuleHandle::new(plugin("downloads").build(), Arc::new(DownloadOnlyPlugin), ScopeId::HOST))
        .unwrap();
    registry
        .register(ModuleHandle::new(
            plugin("bare").build(),
            Arc::new(BarePlugin("bare".to_string())),
            ScopeId::HOST,
        ))
        .unwrap();

    registry.notify(&HostEvent::Shutdown);

    let settings = registry.preference_settings();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].id, "prefs");
    let selections = registry.download_selections();
    assert_eq!(selections.len(), 1);
    assert_eq!(selections[0].id, "bbox");
    assert_eq!(events.lock().unwrap().len(), 1);
}
