use std::error::Error as StdError;
use std::sync::Arc;

use serde::Serialize;

use crate::plugin_system::metadata::PluginMetadata;

/// Error type returned by plugin code
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Constructor exported by a library under the name given in `Plugin-Class`
pub type EntryFactory = Arc<dyn Fn(&PluginMetadata) -> Result<Arc<dyn Plugin>, BoxError> + Send + Sync>;

/// Events the host broadcasts to lifecycle-aware modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HostEvent {
    /// The main map view appeared, changed or went away
    MapFrameChanged {
        previous: Option<String>,
        current: Option<String>,
    },
    /// The user applied new preferences
    PreferencesChanged,
    /// The host is about to exit
    Shutdown,
}

/// A settings page a module contributes to the preferences dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceSetting {
    pub id: String,
    pub title: String,
}

/// An extra source a module contributes to the download dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSelection {
    pub id: String,
    pub label: String,
}

/// Receives host lifecycle notifications
pub trait LifecycleHook: Send + Sync {
    fn on_event(&self, event: &HostEvent);
}

pub trait PreferenceFactory: Send + Sync {
    fn preference_setting(&self) -> PreferenceSetting;
}

pub trait DownloadContributor: Send + Sync {
    fn download_selections(&self) -> Vec<DownloadSelection>;
}

/// Core trait implemented by every plugin entry object.
///
/// Optional capabilities are exposed through the `as_*` probes. A module that
/// does not override a probe simply lacks that capability, and the host
/// skips it without error.
pub trait Plugin: Send + Sync {
    /// The name the plugin reports for itself
    fn name(&self) -> &str;

    fn as_lifecycle(&self) -> Option<&dyn LifecycleHook> {
        None
    }

    fn as_preference_factory(&self) -> Option<&dyn PreferenceFactory> {
        None
    }

    fn as_download_contributor(&self) -> Option<&dyn DownloadContributor> {
        None
    }
}
