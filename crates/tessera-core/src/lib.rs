//! # Tessera Core
//!
//! Plugin loading and dependency core of the Tessera map editor.
//!
//! - [`kernel`]: host description, constants and the crate-wide error.
//! - [`plugin_system`]: plugin metadata, the catalog, dependency resolution,
//!   scoped module loading and the [`PluginOrchestrator`] driving all of it.
//! - [`transport`]: plugin list and artifact downloads.
//! - [`storage`]: the plugin configuration and the plugin directory.
//! - [`ui_bridge`]: questions and reports handed to the host UI.
pub mod kernel;
pub mod plugin_system;
pub mod storage;
pub mod transport;
pub mod ui_bridge;
pub mod utils;

// Re-export key public types for the binary and embedding hosts
pub use kernel::error::Error as KernelError;
pub use kernel::{HostEnvironment, HostVersion, Platform};
pub use plugin_system::{
    LoadOutcome, LoadPass, Plugin, PluginCatalog, PluginMetadata, PluginOrchestrator, UpdateOutcome,
};
pub use storage::PluginConfig;
pub use ui_bridge::{ConfirmRequest, FailureAction, FailureRequest, HeadlessUi, HostUi, Notice};

#[cfg(test)]
mod tests;
