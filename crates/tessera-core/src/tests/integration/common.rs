#![cfg(test)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::{TempDir, tempdir};

use crate::plugin_system::artifact::encode_artifact;
use crate::plugin_system::library::StaticLibraries;
use crate::plugin_system::metadata::{MetadataBuilder, PluginMetadata};
use crate::plugin_system::scope::Symbol;
use crate::plugin_system::traits::{BoxError, HostEvent, LifecycleHook, Plugin};
use crate::storage::config::PluginConfig;
use crate::ui_bridge::{ConfirmRequest, HostUi, Notice};

// ===== MOCK PLUGINS =====

pub type EventLog = Arc<Mutex<Vec<(String, HostEvent)>>>;

/// A plugin that records the host events it receives
pub struct RecordingPlugin {
    name: String,
    events: EventLog,
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_lifecycle(&self) -> Option<&dyn LifecycleHook> {
        Some(self)
    }
}

impl LifecycleHook for RecordingPlugin {
    fn on_event(&self, event: &HostEvent) {
        self.events.lock().unwrap().push((self.name.clone(), event.clone()));
    }
}

/// Libraries for `names`, each exporting `<name>.Entry`
pub fn libraries(names: &[&str], events: &EventLog) -> StaticLibraries {
    let mut libraries = StaticLibraries::new();
    for name in names {
        let events = events.clone();
        let factory = Arc::new(move |metadata: &PluginMetadata| -> Result<Arc<dyn Plugin>, BoxError> {
            Ok(Arc::new(RecordingPlugin { name: metadata.name().to_string(), events: events.clone() }))
        });
        libraries.register(format!("{}.tpk", name), vec![Symbol::entry(format!("{}.Entry", name), factory)]);
    }
    libraries
}

// ===== MOCK HOST UI =====

pub struct ScriptedUi {
    answer: Option<bool>,
    pub confirmations: Mutex<Vec<ConfirmRequest>>,
    pub notices: Mutex<Vec<Notice>>,
}

impl ScriptedUi {
    pub fn new(answer: Option<bool>) -> Arc<Self> {
        Arc::new(Self { answer, confirmations: Mutex::new(Vec::new()), notices: Mutex::new(Vec::new()) })
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl HostUi for ScriptedUi {
    fn confirm(&self, request: &ConfirmRequest) -> Option<bool> {
        self.confirmations.lock().unwrap().push(request.clone());
        self.answer
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

// ===== TEST ENVIRONMENT =====

/// A host installation in a temporary directory
pub struct TestHost {
    pub root: TempDir,
    pub config_path: PathBuf,
    pub plugin_dir: PathBuf,
}

impl TestHost {
    /// Writes a configuration enabling `plugins` and fetching from `sites`
    pub fn new(plugins: &[&str], sites: Vec<String>) -> Self {
        let root = tempdir().unwrap();
        let config_path = root.path().join("preferences.json");
        let plugin_dir = root.path().join("plugins");
        std::fs::create_dir_all(&plugin_dir).unwrap();
        let config = PluginConfig {
            plugins: plugins.iter().map(|p| p.to_string()).collect(),
            sites,
            host_version: Some(18000),
            ..Default::default()
        };
        config.save(&config_path).unwrap();
        Self { root, config_path, plugin_dir }
    }

    pub fn config(&self) -> PluginConfig {
        PluginConfig::load(&self.config_path).unwrap()
    }

    pub fn install(&self, metadata: &PluginMetadata) {
        write_artifact(&self.plugin_dir, metadata);
    }
}

pub fn write_artifact(dir: &Path, metadata: &PluginMetadata) {
    let path = dir.join(format!("{}.tpk", metadata.name()));
    std::fs::write(path, encode_artifact(metadata, b"payload")).unwrap();
}

/// Metadata of a loadable plugin built for host 18000
pub fn artifact(name: &str, version: &str) -> MetadataBuilder {
    MetadataBuilder::new(name)
        .unwrap()
        .version(version)
        .min_host_version(17000)
        .entry_class(&format!("{}.Entry", name))
}
