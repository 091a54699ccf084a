//! # Tessera Core Module Loader
//!
//! Builds one loading scope per plugin and instantiates plugin entry objects.
//!
//! A scope is filled from the plugin's library list in order, so a symbol in
//! a `Class-Path` library shadows a same-named symbol in the artifact itself.
//! Dependency scopes are wired with [`ModuleLoader::add_dependency`], which
//! keeps delegate lists minimal (see [`ScopeGraph`]).
//!
//! Instantiation never unwinds into the caller: a missing entry symbol, a
//! failing constructor and a panicking constructor all come back as a
//! [`LoadFailure`] attributed to the plugin.
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::plugin_system::error::{LoadCause, LoadFailure};
use crate::plugin_system::library::LibraryProvider;
use crate::plugin_system::metadata::PluginMetadata;
use crate::plugin_system::registry::ModuleHandle;
use crate::plugin_system::scope::{ScopeGraph, ScopeId, Symbol, SymbolTable};

pub struct ModuleLoader {
    graph: ScopeGraph,
    libraries: Arc<dyn LibraryProvider>,
    scopes: HashMap<String, ScopeId>,
}

impl ModuleLoader {
    pub fn new(libraries: Arc<dyn LibraryProvider>) -> Self {
        Self::with_host_symbols(libraries, SymbolTable::new())
    }

    /// Creates a loader whose host scope exports `host_symbols`
    pub fn with_host_symbols(libraries: Arc<dyn LibraryProvider>, host_symbols: SymbolTable) -> Self {
        Self {
            graph: ScopeGraph::new(host_symbols),
            libraries,
            scopes: HashMap::new(),
        }
    }

    /// Creates the scope for `metadata` and links it to `dependencies`.
    ///
    /// Libraries the provider does not know are logged and skipped. A plugin
    /// that already has a scope keeps it; only the new dependencies are added.
    pub fn build_scope(&mut self, metadata: &PluginMetadata, dependencies: &[ScopeId]) -> ScopeId {
        if let Some(existing) = self.scope_of(metadata.name()) {
            log::debug!("Plugin '{}' already has scope {:?}", metadata.name(), existing);
            for &dependency in dependencies {
                self.graph.add_dependency(existing, dependency);
            }
            return existing;
        }

        let mut symbols = SymbolTable::new();
        for library in &metadata.library_paths {
            match self.libraries.load(library) {
                Some(exports) => {
                    for symbol in exports {
                        if !symbols.insert(symbol.clone()) {
                            log::debug!(
                                "Plugin '{}': symbol '{}' from {} shadowed by an earlier library",
                                metadata.name(),
                                symbol.name,
                                symbol.origin
                            );
                        }
                    }
                }
                None => log::warn!("Plugin '{}': library {} is not available", metadata.name(), library),
            }
        }

        let scope = self.graph.add_scope(metadata.name(), symbols);
        self.scopes.insert(metadata.name().to_string(), scope);
        for &dependency in dependencies {
            self.graph.add_dependency(scope, dependency);
        }
        scope
    }

    pub fn add_dependency(&mut self, scope: ScopeId, dependency: ScopeId) -> bool {
        self.graph.add_dependency(scope, dependency)
    }

    pub fn scope_of(&self, plugin: &str) -> Option<ScopeId> {
        self.scopes.get(plugin).copied()
    }

    pub fn graph(&self) -> &ScopeGraph {
        &self.graph
    }

    pub fn resolve(&mut self, scope: ScopeId, name: &str) -> Option<Symbol> {
        self.graph.resolve(scope, name)
    }

    /// Looks up the entry symbol in `scope` and constructs the plugin
    pub fn instantiate(&mut self, metadata: &PluginMetadata, scope: ScopeId) -> Result<ModuleHandle, LoadFailure> {
        if self.graph.scope(scope).is_none() {
            return Err(LoadFailure::Internal {
                message: format!("unknown scope {:?} for plugin '{}'", scope, metadata.name()),
            });
        }
        let name = metadata.name();
        let Some(class) = metadata.entry_class.as_deref() else {
            return Err(LoadFailure::attributed(name, LoadCause::MissingEntryClass));
        };

        log::info!(
            "loading plugin '{}' (version {})",
            name,
            metadata.local_version.as_deref().or(metadata.version.as_deref()).unwrap_or("unknown")
        );

        let symbol = self
            .graph
            .resolve(scope, class)
            .ok_or_else(|| LoadFailure::attributed(name, LoadCause::EntryNotFound(class.to_string())))?;
        let factory = symbol
            .as_entry()
            .cloned()
            .ok_or_else(|| LoadFailure::attributed(name, LoadCause::NotAnEntry(class.to_string())))?;

        match panic::catch_unwind(AssertUnwindSafe(|| factory(metadata))) {
            Ok(Ok(plugin)) => Ok(ModuleHandle::new(metadata.clone(), plugin, scope)),
            Ok(Err(e)) => Err(LoadFailure::attributed(name, LoadCause::Construction(e.to_string()))),
            Err(panic_obj) => {
                let panic_msg = if let Some(s_ref) = panic_obj.downcast_ref::<&'static str>() {
                    (*s_ref).to_string()
                } else if let Some(s_obj) = panic_obj.downcast_ref::<String>() {
                    s_obj.clone()
                } else {
                    "Unknown panic reason".to_string()
                };
                Err(LoadFailure::attributed(name, LoadCause::Panicked(panic_msg)))
            }
        }
    }
}
