#![cfg(test)]

//! Mock plugins and a scripted UI shared by the plugin system tests.
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::plugin_system::library::StaticLibraries;
use crate::plugin_system::metadata::{MetadataBuilder, PluginMetadata};
use crate::plugin_system::scope::Symbol;
use crate::plugin_system::traits::{
    BoxError, DownloadContributor, DownloadSelection, EntryFactory, HostEvent, LifecycleHook, Plugin,
    PreferenceFactory, PreferenceSetting,
};
use crate::transport::client::HttpSource;
use crate::transport::error::TransportError;
use crate::ui_bridge::{ConfirmRequest, FailureAction, FailureRequest, HostUi, Notice};

pub type EventLog = Arc<Mutex<Vec<(String, HostEvent)>>>;

/// Plugin recording every lifecycle event it receives
pub struct TestPlugin {
    name: String,
    events: EventLog,
    with_preferences: bool,
}

impl TestPlugin {
    pub fn new(name: &str, events: EventLog) -> Self {
        Self { name: name.to_string(), events, with_preferences: false }
    }

    pub fn with_preferences(mut self) -> Self {
        self.with_preferences = true;
        self
    }
}

impl Plugin for TestPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_lifecycle(&self) -> Option<&dyn LifecycleHook> {
        Some(self)
    }

    fn as_preference_factory(&self) -> Option<&dyn PreferenceFactory> {
        if self.with_preferences { Some(self) } else { None }
    }
}

impl LifecycleHook for TestPlugin {
    fn on_event(&self, event: &HostEvent) {
        self.events.lock().unwrap().push((self.name.clone(), event.clone()));
    }
}

impl PreferenceFactory for TestPlugin {
    fn preference_setting(&self) -> PreferenceSetting {
        PreferenceSetting { id: self.name.clone(), title: format!("{} settings", self.name) }
    }
}

/// Plugin with no optional capability besides download sources
pub struct DownloadOnlyPlugin;

impl Plugin for DownloadOnlyPlugin {
    fn name(&self) -> &str {
        "downloads"
    }

    fn as_download_contributor(&self) -> Option<&dyn DownloadContributor> {
        Some(self)
    }
}

impl DownloadContributor for DownloadOnlyPlugin {
    fn download_selections(&self) -> Vec<DownloadSelection> {
        vec![DownloadSelection { id: "bbox".to_string(), label: "Bounding box".to_string() }]
    }
}

/// Plugin without any optional capability
pub struct BarePlugin(pub String);

impl Plugin for BarePlugin {
    fn name(&self) -> &str {
        &self.0
    }
}

pub fn entry_name(plugin: &str) -> String {
    format!("{}.Entry", plugin)
}

pub fn test_factory(events: EventLog) -> EntryFactory {
    Arc::new(move |metadata: &PluginMetadata| -> Result<Arc<dyn Plugin>, BoxError> {
        Ok(Arc::new(TestPlugin::new(metadata.name(), events.clone())))
    })
}

pub fn failing_factory(message: &'static str) -> EntryFactory {
    Arc::new(move |_: &PluginMetadata| -> Result<Arc<dyn Plugin>, BoxError> { Err(message.into()) })
}

pub fn panicking_factory() -> EntryFactory {
    Arc::new(|_: &PluginMetadata| -> Result<Arc<dyn Plugin>, BoxError> { panic!("entry exploded") })
}

/// Libraries `<name>.tpk` exporting `<name>.Entry`, built by `factory`
pub fn libraries_for(names: &[&str], factory: EntryFactory) -> StaticLibraries {
    let mut libraries = StaticLibraries::new();
    for name in names {
        libraries.register(format!("{}.tpk", name), vec![Symbol::entry(entry_name(name), factory.clone())]);
    }
    libraries
}

/// Loadable metadata for `name` with its artifact under `/plugins`
pub fn plugin(name: &str) -> MetadataBuilder {
    MetadataBuilder::new(name)
        .unwrap()
        .version("1")
        .entry_class(&entry_name(name))
        .artifact_path(format!("/plugins/{}.tpk", name))
}

/// UI answering every question with `answer` and recording all traffic
pub struct RecordingUi {
    answer: Option<bool>,
    action: Option<FailureAction>,
    pub confirmations: Mutex<Vec<ConfirmRequest>>,
    pub failure_requests: Mutex<Vec<FailureRequest>>,
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingUi {
    pub fn new(answer: Option<bool>) -> Arc<Self> {
        Self::choosing(answer, None)
    }

    /// Also answers failure questions with `action`
    pub fn choosing(answer: Option<bool>, action: Option<FailureAction>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            action,
            confirmations: Mutex::new(Vec::new()),
            failure_requests: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        })
    }

    pub fn failure_requests(&self) -> Vec<FailureRequest> {
        self.failure_requests.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> Vec<ConfirmRequest> {
        self.confirmations.lock().unwrap().clone()
    }
}

impl HostUi for RecordingUi {
    fn confirm(&self, request: &ConfirmRequest) -> Option<bool> {
        self.confirmations.lock().unwrap().push(request.clone());
        self.answer
    }

    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn choose_failure_action(&self, request: &FailureRequest) -> Option<FailureAction> {
        self.failure_requests.lock().unwrap().push(request.clone());
        self.action
    }
}

/// In-memory web server for orchestrator tests
#[derive(Default)]
pub struct StaticSite {
    documents: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn get(&self, url: &Url, cancel: &CancellationToken) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }
        self.documents
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| TransportError::Status { url: url.to_string(), status: 404 })
    }
}

#[async_trait]
impl HttpSource for StaticSite {
    async fn fetch_text(&self, url: &Url, cancel: &CancellationToken) -> Result<String, TransportError> {
        let body = self.get(url, cancel)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_to_file(
        &self,
        url: &Url,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, TransportError> {
        let body = self.get(url, cancel)?;
        tokio::fs::write(destination, &body)
            .await
            .map_err(|e| TransportError::io(e, "write", destination.to_path_buf()))?;
        Ok(body.len() as u64)
    }
}
