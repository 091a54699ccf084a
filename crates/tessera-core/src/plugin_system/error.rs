//! # Tessera Core Plugin System Errors
//!
//! Defines [`PluginSystemError`] for metadata, catalog and artifact problems,
//! and [`LoadFailure`], the tagged result of a failed instantiation.
//!
//! A load failure is either attributed to one plugin (its entry symbol was
//! missing, its constructor failed or panicked) or internal to the loader.
//! Callers branch on the variant; a precondition rejection is not an error at
//! all and is reported through [`RejectReason`](crate::plugin_system::dependency::RejectReason).
use std::path::PathBuf;

use crate::plugin_system::version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Plugin metadata error for '{plugin}': {message}")]
    FormatError { plugin: String, message: String },

    #[error("Plugin list error in '{origin}' at line {line}: {message}")]
    ListingError {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("Plugin artifact error for '{}' during '{operation}': {source}", path.display())]
    ArtifactIo {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plugin name: '{0}'")]
    InvalidName(String),

    #[error("Version parsing error: {0}")]
    VersionParsing(#[from] VersionError),

    #[error(transparent)]
    Load(#[from] LoadFailure),

    #[error("Internal plugin system error: {0}")]
    InternalError(String),
}

impl PluginSystemError {
    pub fn format(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        PluginSystemError::FormatError {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    pub fn artifact_io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        PluginSystemError::ArtifactIo {
            path,
            operation: operation.into(),
            source,
        }
    }
}

/// Why instantiating a plugin's entry object failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadCause {
    #[error("no Plugin-Class declared")]
    MissingEntryClass,
    #[error("main class '{0}' was not found")]
    EntryNotFound(String),
    #[error("symbol '{0}' is not an entry factory")]
    NotAnEntry(String),
    #[error("construction failed: {0}")]
    Construction(String),
    #[error("construction panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    #[error("Could not load plugin '{plugin}': {cause}")]
    Attributed { plugin: String, cause: LoadCause },

    #[error("Internal loading error: {message}")]
    Internal { message: String },
}

impl LoadFailure {
    pub fn attributed(plugin: impl Into<String>, cause: LoadCause) -> Self {
        LoadFailure::Attributed {
            plugin: plugin.into(),
            cause,
        }
    }

    /// Name of the offending plugin, if the failure can be pinned on one
    pub fn plugin(&self) -> Option<&str> {
        match self {
            LoadFailure::Attributed { plugin, .. } => Some(plugin),
            LoadFailure::Internal { .. } => None,
        }
    }

    pub fn is_attributed(&self) -> bool {
        matches!(self, LoadFailure::Attributed { .. })
    }
}
