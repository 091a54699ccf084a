//! # Tessera Core Loading Scopes
//!
//! Every plugin gets its own [`Scope`]: a symbol table filled from the
//! plugin's libraries plus an ordered list of delegate scopes for the plugins
//! it requires. All scopes live in one [`ScopeGraph`] arena; scope `0` is the
//! host scope every other scope falls back to.
//!
//! Resolution order for a symbol requested in scope `S`:
//! 1. `S`'s memo cache
//! 2. `S`'s own symbols
//! 3. each delegate, depth first, in delegate order
//! 4. the host scope
//!
//! Delegate lists are kept minimal. Adding `A` as a dependency of `B` drops
//! every direct delegate of `B` that is already reachable through `A`, and
//! adding a dependency that is already reachable is a no-op. Reachability
//! never depends on insertion order, but delegate order decides which of two
//! same-named symbols wins.
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::plugin_system::traits::EntryFactory;

/// Index of a scope inside a [`ScopeGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const HOST: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone)]
pub enum SymbolKind {
    /// Constructor of a plugin entry object
    Entry(EntryFactory),
    /// Any other shared value
    Value(Arc<dyn Any + Send + Sync>),
}

/// A named export of a library
#[derive(Clone)]
pub struct Symbol {
    pub name: String,
    /// Library the symbol was loaded from
    pub origin: String,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn entry(name: impl Into<String>, factory: EntryFactory) -> Self {
        Self { name: name.into(), origin: String::new(), kind: SymbolKind::Entry(factory) }
    }

    pub fn value<T: Any + Send + Sync>(name: impl Into<String>, value: T) -> Self {
        Self { name: name.into(), origin: String::new(), kind: SymbolKind::Value(Arc::new(value)) }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn as_entry(&self) -> Option<&EntryFactory> {
        match &self.kind {
            SymbolKind::Entry(factory) => Some(factory),
            SymbolKind::Value(_) => None,
        }
    }

    pub fn downcast_value<T: Any>(&self) -> Option<&T> {
        match &self.kind {
            SymbolKind::Value(value) => value.downcast_ref::<T>(),
            SymbolKind::Entry(_) => None,
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            SymbolKind::Entry(_) => "entry",
            SymbolKind::Value(_) => "value",
        };
        f.debug_struct("Symbol")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("kind", &kind)
            .finish()
    }
}

/// Symbols of one scope. The first definition of a name wins.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a symbol unless the name is taken; returns whether it was added
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        if self.symbols.contains_key(&symbol.name) {
            return false;
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[derive(Debug)]
pub struct Scope {
    name: String,
    symbols: SymbolTable,
    delegates: Vec<ScopeId>,
    cache: HashMap<String, Symbol>,
}

impl Scope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn delegates(&self) -> &[ScopeId] {
        &self.delegates
    }

    pub fn cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }
}

/// Arena holding the host scope and every plugin scope
#[derive(Debug)]
pub struct ScopeGraph {
    scopes: Vec<Scope>,
}

impl Default for ScopeGraph {
    fn default() -> Self {
        Self::new(SymbolTable::new())
    }
}

impl ScopeGraph {
    /// Creates a graph whose host scope exports `host_symbols`
    pub fn new(host_symbols: SymbolTable) -> Self {
        Self {
            scopes: vec![Scope {
                name: "host".to_string(),
                symbols: host_symbols,
                delegates: Vec::new(),
                cache: HashMap::new(),
            }],
        }
    }

    pub fn add_scope(&mut self, name: impl Into<String>, symbols: SymbolTable) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            symbols,
            delegates: Vec::new(),
            cache: HashMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Whether `to` can be reached from `from` through delegate edges
    pub fn reaches(&self, from: ScopeId, to: ScopeId) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            let Some(scope) = self.scopes.get(current.0) else {
                continue;
            };
            for &next in &scope.delegates {
                if next == to {
                    return true;
                }
                stack.push(next);
            }
        }
        false
    }

    /// Makes `dependency` a delegate of `scope`.
    ///
    /// Returns `false` without changes when the edge is redundant (already
    /// reachable), points to the scope itself or the host, or would close a
    /// cycle.
    pub fn add_dependency(&mut self, scope: ScopeId, dependency: ScopeId) -> bool {
        if scope == dependency || dependency == ScopeId::HOST || scope == ScopeId::HOST {
            return false;
        }
        if scope.0 >= self.scopes.len() || dependency.0 >= self.scopes.len() {
            return false;
        }
        if self.reaches(dependency, scope) {
            log::warn!(
                "Not linking scope '{}' to '{}': would create a cycle",
                self.scopes[scope.0].name,
                self.scopes[dependency.0].name
            );
            return false;
        }
        if self.reaches(scope, dependency) {
            return false;
        }

        let redundant: Vec<ScopeId> = self.scopes[scope.0]
            .delegates
            .iter()
            .copied()
            .filter(|&d| self.reaches(dependency, d))
            .collect();
        let delegates = &mut self.scopes[scope.0].delegates;
        delegates.retain(|d| !redundant.contains(d));
        delegates.push(dependency);

        for entry in &mut self.scopes {
            entry.cache.clear();
        }
        true
    }

    /// Resolves `name` as seen from `scope`, caching a hit
    pub fn resolve(&mut self, scope: ScopeId, name: &str) -> Option<Symbol> {
        let own = self.scopes.get(scope.0)?;
        if let Some(hit) = own.cache.get(name) {
            return Some(hit.clone());
        }
        let found = self.lookup(scope, name)?;
        self.scopes[scope.0].cache.insert(name.to_string(), found.clone());
        Some(found)
    }

    fn lookup(&self, scope: ScopeId, name: &str) -> Option<Symbol> {
        let mut visited = HashSet::new();
        self.lookup_in(scope, name, &mut visited)
            .or_else(|| self.scopes[ScopeId::HOST.0].symbols.get(name).cloned())
    }

    fn lookup_in(&self, scope: ScopeId, name: &str, visited: &mut HashSet<ScopeId>) -> Option<Symbol> {
        if !visited.insert(scope) {
            return None;
        }
        let current = self.scopes.get(scope.0)?;
        if let Some(hit) = current.symbols.get(name) {
            return Some(hit.clone());
        }
        current
            .delegates
            .iter()
            .find_map(|&delegate| self.lookup_in(delegate, name, visited))
    }
}
