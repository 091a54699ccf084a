//! # Tessera Core Plugin System
//!
//! Discovery, validation, loading and activation of editor plugins.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`metadata`]**: [`PluginMetadata`], parsed from the `Key: Value` block
//!   every artifact and catalog entry carries.
//! - **[`artifact`]** and **[`listing`]**: the `.tpk` artifact layout and the
//!   line-oriented remote catalog document.
//! - **[`catalog`]**: [`PluginCatalog`], the merged view of cached remote
//!   lists, installed artifacts and active modules.
//! - **[`deprecation`]**: built-in deprecated and unmaintained plugin names.
//! - **[`dependency`]** and **[`resolver`]**: precondition checks, cycle
//!   detection and stage ordering ([`DependencyResolver`]).
//! - **[`scope`]**, **[`library`]** and **[`loader`]**: per-plugin symbol
//!   scopes with delegation to dependencies and instantiation of entry
//!   objects ([`ModuleLoader`]).
//! - **[`registry`]**: [`ModuleRegistry`], the active modules and the fan-out
//!   of host lifecycle events.
//! - **[`traits`]**: [`Plugin`] and its optional capabilities.
//! - **[`update_policy`]**: when to offer an automatic update.
//! - **[`orchestrator`]**: [`PluginOrchestrator`], which ties it all together.
//! - **[`error`]**: [`PluginSystemError`] and [`LoadFailure`].
pub mod artifact;
pub mod catalog;
pub mod dependency;
pub mod deprecation;
pub mod error;
pub mod library;
pub mod listing;
pub mod loader;
pub mod metadata;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod traits;
pub mod update_policy;
pub mod version;

pub use catalog::{CatalogEntry, PluginCatalog, Source};
pub use dependency::RejectReason;
pub use deprecation::DeprecatedPlugin;
pub use error::{LoadCause, LoadFailure, PluginSystemError};
pub use library::{LibraryProvider, StaticLibraries};
pub use loader::ModuleLoader;
pub use metadata::{MetadataBuilder, PluginMetadata};
pub use orchestrator::{FailureResolution, LoadOutcome, LoadPass, OrchestratorBuilder, PluginOrchestrator, UpdateOutcome};
pub use registry::{ModuleHandle, ModuleRegistry};
pub use resolver::{DependencyResolver, Resolution};
pub use scope::{ScopeGraph, ScopeId, Symbol, SymbolTable};
pub use traits::{DownloadContributor, HostEvent, LifecycleHook, Plugin, PreferenceFactory};
pub use update_policy::{UpdatePolicy, UpdateSettings};

#[cfg(test)]
mod tests;
