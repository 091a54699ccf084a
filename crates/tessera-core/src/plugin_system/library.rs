//! Libraries a plugin scope can load symbols from.
//!
//! Plugins name their libraries through `Class-Path` and their artifact file.
//! The host decides what each library exports; [`StaticLibraries`] serves
//! compiled-in symbol tables keyed by library file name.
use std::collections::HashMap;

use url::Url;

use crate::plugin_system::scope::Symbol;

/// Source of the symbols exported by a library
pub trait LibraryProvider: Send + Sync {
    /// Symbols exported by `library`, or `None` if it is unknown
    fn load(&self, library: &Url) -> Option<Vec<Symbol>>;
}

/// Library file name for a library URL, e.g. `routing.tpk`
pub fn library_file_name(library: &Url) -> Option<String> {
    library
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Clone, Default)]
pub struct StaticLibraries {
    libraries: HashMap<String, Vec<Symbol>>,
}

impl StaticLibraries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the exports of the library with file name `file_name`
    pub fn register(&mut self, file_name: impl Into<String>, symbols: Vec<Symbol>) -> &mut Self {
        let file_name = file_name.into();
        let symbols = symbols.into_iter().map(|s| s.with_origin(file_name.clone())).collect();
        self.libraries.insert(file_name, symbols);
        self
    }

    pub fn with_library(mut self, file_name: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        self.register(file_name, symbols);
        self
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.libraries.contains_key(file_name)
    }
}

impl LibraryProvider for StaticLibraries {
    fn load(&self, library: &Url) -> Option<Vec<Symbol>> {
        let file_name = library_file_name(library)?;
        self.libraries.get(&file_name).cloned()
    }
}
