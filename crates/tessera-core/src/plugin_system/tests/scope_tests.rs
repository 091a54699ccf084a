#![cfg(test)]

use crate::plugin_system::scope::{ScopeGraph, ScopeId, Symbol, SymbolTable};

fn table(symbols: &[(&str, &str)]) -> SymbolTable {
    let mut table = SymbolTable::new();
    for (name, value) in symbols {
        table.insert(Symbol::value(*name, value.to_string()).with_origin(*value));
    }
    table
}

fn resolved_origin(graph: &mut ScopeGraph, scope: ScopeId, name: &str) -> Option<String> {
    graph.resolve(scope, name).map(|s| s.origin)
}

#[test]
fn test_first_definition_wins() {
    let mut symbols = SymbolTable::new();
    assert!(symbols.insert(Symbol::value("x", 1u32)));
    assert!(!symbols.insert(Symbol::value("x", 2u32)));
    assert_eq!(symbols.get("x").and_then(|s| s.downcast_value::<u32>()), Some(&1));
}

#[test]
fn test_own_symbols_shadow_delegates_and_host() {
    let mut graph = ScopeGraph::new(table(&[("Shared", "host"), ("HostOnly", "host")]));
    let lib = graph.add_scope("lib", table(&[("Shared", "lib"), ("LibOnly", "lib")]));
    let app = graph.add_scope("app", table(&[("Shared", "app")]));
    assert!(graph.add_dependency(app, lib));

    assert_eq!(resolved_origin(&mut graph, app, "Shared").as_deref(), Some("app"));
    assert_eq!(resolved_origin(&mut graph, app, "LibOnly").as_deref(), Some("lib"));
    assert_eq!(resolved_origin(&mut graph, app, "HostOnly").as_deref(), Some("host"));
    assert_eq!(resolved_origin(&mut graph, lib, "Shared").as_deref(), Some("lib"));
    assert_eq!(resolved_origin(&mut graph, app, "Nowhere"), None);
}

#[test]
fn test_delegate_order_decides_collisions() {
    let mut graph = ScopeGraph::default();
    let first = graph.add_scope("first", table(&[("Collide", "first")]));
    let second = graph.add_scope("second", table(&[("Collide", "second")]));
    let app = graph.add_scope("app", SymbolTable::new());
    graph.add_dependency(app, first);
    graph.add_dependency(app, second);

    assert_eq!(graph.scope(app).unwrap().delegates(), &[first, second]);
    assert_eq!(resolved_origin(&mut graph, app, "Collide").as_deref(), Some("first"));
}

#[test]
fn test_redundant_edges_are_pruned() {
    let mut graph = ScopeGraph::default();
    let base = graph.add_scope("base", table(&[("Base", "base")]));
    let mid = graph.add_scope("mid", SymbolTable::new());
    let top = graph.add_scope("top", SymbolTable::new());

    assert!(graph.add_dependency(top, base));
    assert!(graph.add_dependency(mid, base));
    // base becomes reachable through mid, so the direct edge goes away
    assert!(graph.add_dependency(top, mid));
    assert_eq!(graph.scope(top).unwrap().delegates(), &[mid]);

    // already reachable, nothing changes
    assert!(!graph.add_dependency(top, base));
    assert_eq!(graph.scope(top).unwrap().delegates(), &[mid]);
    assert_eq!(resolved_origin(&mut graph, top, "Base").as_deref(), Some("base"));
}

#[test]
fn test_rejected_edges() {
    let mut graph = ScopeGraph::default();
    let a = graph.add_scope("a", SymbolTable::new());
    let b = graph.add_scope("b", SymbolTable::new());

    assert!(!graph.add_dependency(a, a));
    assert!(!graph.add_dependency(a, ScopeId::HOST));
    assert!(graph.add_dependency(a, b));
    assert!(!graph.add_dependency(b, a));
    assert!(graph.reaches(a, b));
    assert!(!graph.reaches(b, a));
}

#[test]
fn test_resolution_is_memoized_and_invalidated() {
    let mut graph = ScopeGraph::default();
    let lib = graph.add_scope("lib", table(&[("Thing", "lib")]));
    let other = graph.add_scope("other", table(&[("Thing", "other")]));
    let app = graph.add_scope("app", SymbolTable::new());
    graph.add_dependency(app, other);

    assert_eq!(resolved_origin(&mut graph, app, "Thing").as_deref(), Some("other"));
    assert!(graph.scope(app).unwrap().cached("Thing"));

    graph.add_dependency(app, lib);
    assert!(!graph.scope(app).unwrap().cached("Thing"));
    assert_eq!(resolved_origin(&mut graph, app, "Thing").as_deref(), Some("other"));
}
