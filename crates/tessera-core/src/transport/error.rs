//! # Tessera Core Transport Errors
//!
//! Defines [`TransportError`] for plugin list and artifact downloads.
//!
//! [`TransportError::Cancelled`] marks a user-initiated stop. It is an
//! outcome, not a failure, and callers check
//! [`is_cancellation`](TransportError::is_cancellation) before reporting.
use std::path::PathBuf;

use crate::plugin_system::error::PluginSystemError;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server returned status {status} for '{url}'")]
    Status { url: String, status: u16 },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error during '{operation}' on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin '{0}' has no download location")]
    MissingDownloadLocation(String),

    #[error("Download of plugin '{plugin}' refused: it {requirement}")]
    VersionGateRejected { plugin: String, requirement: String },

    #[error("Plugin list could not be parsed: {0}")]
    ListParse(#[source] PluginSystemError),

    #[error("Background worker failed: {0}")]
    Worker(String),
}

impl TransportError {
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        TransportError::Io {
            path,
            operation: operation.into(),
            source,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}
