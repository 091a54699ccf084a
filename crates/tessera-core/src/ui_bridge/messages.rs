use std::fmt;

use crate::plugin_system::dependency::RejectReason;
use crate::plugin_system::deprecation::DeprecatedPlugin;
use crate::plugin_system::error::LoadFailure;
use crate::ui_bridge::MessageSeverity;

/// A yes/no question the core needs the host to answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmRequest {
    /// Drop an unmaintained plugin from the load set
    DisableUnmaintained { plugin: String },
    /// Remove a plugin that failed to load from the configuration
    DisableAfterLoadFailure { plugin: String, cause: String },
    /// Download a plugin although the host or runtime is too old for it
    DownloadDespiteVersion { plugin: String, requirement: String },
    /// Run an automatic plugin update now
    RunUpdate { reason: String },
}

impl fmt::Display for ConfirmRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmRequest::DisableUnmaintained { plugin } => write!(
                f,
                "Plugin '{}' is no longer maintained and may not work. Disable it?",
                plugin
            ),
            ConfirmRequest::DisableAfterLoadFailure { plugin, cause } => write!(
                f,
                "Could not load plugin '{}' ({}). Disable it permanently?",
                plugin, cause
            ),
            ConfirmRequest::DownloadDespiteVersion { plugin, requirement } => write!(
                f,
                "Plugin '{}' {}. Download it anyway?",
                plugin, requirement
            ),
            ConfirmRequest::RunUpdate { reason } => write!(f, "{}. Update plugins now?", reason),
        }
    }
}

/// What to do about a plugin a failure was pinned on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Download a newer version of the plugin
    Update,
    /// Remove the plugin from the configuration
    Disable,
    Keep,
}

/// A plugin caused a failure and the user decides how to react
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRequest {
    pub plugin: String,
    pub cause: String,
    /// A site advertises a newer version than the installed one
    pub update_available: bool,
}

impl fmt::Display for FailureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plugin '{}' caused an error ({}).", self.plugin, self.cause)?;
        if self.update_available {
            write!(f, " A newer version is available.")?;
        }
        write!(f, " Update, disable or keep it?")
    }
}

/// A batch report shown to the user once, covering every affected plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Deprecated plugins were removed from the configuration
    DeprecatedRemoved(Vec<DeprecatedPlugin>),
    /// Requested plugins the catalog knows nothing about
    MissingPluginInformation(Vec<String>),
    PluginsRejected(Vec<(String, RejectReason)>),
    /// Downloads that failed, with the error text
    UpdateFailed(Vec<(String, String)>),
    LoadFailed(Vec<LoadFailure>),
}

impl Notice {
    pub fn severity(&self) -> MessageSeverity {
        match self {
            Notice::DeprecatedRemoved(_) => MessageSeverity::Info,
            Notice::MissingPluginInformation(_) | Notice::PluginsRejected(_) => MessageSeverity::Warning,
            Notice::UpdateFailed(_) | Notice::LoadFailed(_) => MessageSeverity::Error,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notice::DeprecatedRemoved(_) => "Deprecated plugins",
            Notice::MissingPluginInformation(_) => "Missing plugin information",
            Notice::PluginsRejected(_) => "Plugins not loaded",
            Notice::UpdateFailed(_) => "Plugin update failed",
            Notice::LoadFailed(_) => "Plugin loading failed",
        }
    }

    /// Names of the plugins the notice is about
    pub fn plugins(&self) -> Vec<String> {
        match self {
            Notice::DeprecatedRemoved(list) => list.iter().map(|d| d.name.clone()).collect(),
            Notice::MissingPluginInformation(names) => names.clone(),
            Notice::PluginsRejected(list) => list.iter().map(|(n, _)| n.clone()).collect(),
            Notice::UpdateFailed(list) => list.iter().map(|(n, _)| n.clone()).collect(),
            Notice::LoadFailed(list) => list.iter().filter_map(|f| f.plugin().map(str::to_string)).collect(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DeprecatedRemoved(list) => {
                writeln!(f, "The following plugins are no longer necessary and have been deactivated:")?;
                for plugin in list {
                    match &plugin.reason {
                        Some(reason) => writeln!(f, "  {} ({})", plugin.name, reason)?,
                        None => writeln!(f, "  {}", plugin.name)?,
                    }
                }
            }
            Notice::MissingPluginInformation(names) => {
                writeln!(f, "No information available for the following plugins:")?;
                for name in names {
                    writeln!(f, "  {}", name)?;
                }
            }
            Notice::PluginsRejected(list) => {
                writeln!(f, "The following plugins could not be loaded:")?;
                for (name, reason) in list {
                    writeln!(f, "  {}: {}", name, reason)?;
                }
            }
            Notice::UpdateFailed(list) => {
                writeln!(f, "The following plugins could not be downloaded:")?;
                for (name, error) in list {
                    writeln!(f, "  {}: {}", name, error)?;
                }
            }
            Notice::LoadFailed(list) => {
                writeln!(f, "Loading failed:")?;
                for failure in list {
                    writeln!(f, "  {}", failure)?;
                }
            }
        }
        Ok(())
    }
}
