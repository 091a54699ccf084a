//! # Tessera Core Module Registry
//!
//! Holds the handles of every successfully loaded module for the lifetime of
//! the process and fans host lifecycle events out to them.
//!
//! The registry remembers the last `MapFrameChanged` event. A module or
//! listener added afterwards receives that state immediately, so late
//! modules observe the same map frame as early ones.
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::metadata::PluginMetadata;
use crate::plugin_system::scope::ScopeId;
use crate::plugin_system::traits::{DownloadSelection, HostEvent, LifecycleHook, Plugin, PreferenceSetting};

/// One instantiated plugin together with its metadata and loading scope
pub struct ModuleHandle {
    metadata: PluginMetadata,
    plugin: Arc<dyn Plugin>,
    scope: ScopeId,
}

impl ModuleHandle {
    pub fn new(metadata: PluginMetadata, plugin: Arc<dyn Plugin>, scope: ScopeId) -> Self {
        Self { metadata, plugin, scope }
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Forwards `event` if the module is lifecycle-aware
    pub fn notify(&self, event: &HostEvent) {
        if let Some(hook) = self.plugin.as_lifecycle() {
            hook.on_event(event);
        }
    }

    pub fn preference_setting(&self) -> Option<PreferenceSetting> {
        self.plugin.as_preference_factory().map(|f| f.preference_setting())
    }

    pub fn download_selections(&self) -> Vec<DownloadSelection> {
        self.plugin
            .as_download_contributor()
            .map(|c| c.download_selections())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.metadata.name())
            .field("version", &self.metadata.local_version)
            .field("scope", &self.scope)
            .finish()
    }
}

#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<ModuleHandle>>,
    listeners: Vec<Arc<dyn LifecycleHook>>,
    map_frame: Option<HostEvent>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a loaded module. Names are unique for the process lifetime.
    pub fn register(&mut self, handle: ModuleHandle) -> Result<Arc<ModuleHandle>, PluginSystemError> {
        if self.get(handle.name()).is_some() {
            return Err(PluginSystemError::InternalError(format!(
                "Module already registered: {}",
                handle.name()
            )));
        }
        let handle = Arc::new(handle);
        if let Some(event) = &self.map_frame {
            handle.notify(&replayed(event));
        }
        self.modules.push(handle.clone());
        Ok(handle)
    }

    /// Adds a host-side lifecycle listener
    pub fn add_listener(&mut self, listener: Arc<dyn LifecycleHook>) {
        if let Some(event) = &self.map_frame {
            listener.on_event(&replayed(event));
        }
        self.listeners.push(listener);
    }

    /// Delivers `event` to every listener, then every module in load order
    pub fn notify(&mut self, event: &HostEvent) {
        if let HostEvent::MapFrameChanged { .. } = event {
            self.map_frame = Some(event.clone());
        }
        for listener in &self.listeners {
            listener.on_event(event);
        }
        for module in &self.modules {
            module.notify(event);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModuleHandle>> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn modules(&self) -> &[Arc<ModuleHandle>] {
        &self.modules
    }

    pub fn active_metadata(&self) -> Vec<PluginMetadata> {
        self.modules.iter().map(|m| m.metadata().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn preference_settings(&self) -> Vec<PreferenceSetting> {
        self.modules.iter().filter_map(|m| m.preference_setting()).collect()
    }

    pub fn download_selections(&self) -> Vec<DownloadSelection> {
        self.modules.iter().flat_map(|m| m.download_selections()).collect()
    }
}

fn replayed(event: &HostEvent) -> HostEvent {
    match event {
        HostEvent::MapFrameChanged { current, .. } => HostEvent::MapFrameChanged {
            previous: None,
            current: current.clone(),
        },
        other => other.clone(),
    }
}
