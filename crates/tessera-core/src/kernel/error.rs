//! # Tessera Core Kernel Errors
//!
//! Defines [`Error`], the crate-wide error enum. Each subsystem keeps its own
//! typed error ([`PluginSystemError`], [`TransportError`],
//! [`StorageSystemError`], [`UiBridgeError`]) and converts into this one with `?`.
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::plugin_system::error::PluginSystemError;
use crate::storage::error::StorageSystemError;
use crate::transport::error::TransportError;
use crate::ui_bridge::error::UiBridgeError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Specific, typed plugin system error
    #[error("Plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    /// Network or download error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Failure talking to the host's user interface
    #[error("UI bridge error: {0}")]
    UiBridge(#[from] UiBridgeError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl Error {
    /// Wraps an I/O error together with the operation and path it failed on
    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        Error::StorageSystem(StorageSystemError::io(source, operation, path))
    }

    /// True for fatal plugin directory problems that abort a whole run
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::StorageSystem(_))
    }
}
