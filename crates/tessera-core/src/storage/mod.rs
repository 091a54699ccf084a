//! # Tessera Core Storage
//!
//! Persistent state of the plugin core:
//!
//! - **Configuration**: [`PluginConfig`], the enabled plugins, plugin sites and
//!   update bookkeeping, stored as JSON, YAML or TOML ([`ConfigFormat`]).
//! - **Plugin directory**: [`PluginDirectory`], installed artifacts, staged
//!   downloads and site list caches, with the install step that swaps staged
//!   downloads into place.
pub mod config;
pub mod error;
pub mod local;

pub use config::{ConfigFormat, PluginConfig};
pub use error::StorageSystemError;
pub use local::{InstallReport, PluginDirectory};

#[cfg(test)]
mod tests;
