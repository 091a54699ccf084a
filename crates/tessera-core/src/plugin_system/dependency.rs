use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::plugin_system::metadata::PluginMetadata;

/// Why a plugin was removed from the load set before loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The plugin only runs on another platform
    WrongPlatform { required: String },
    /// The plugin needs a newer runtime than the host provides
    RuntimeTooOld { required: u32, current: u32 },
    /// The plugin needs a newer host version
    VersionTooOld { required: u32, current: u32 },
    /// Required plugins that are not part of the load set
    MissingDependency(Vec<String>),
    /// Plugins that require each other, in cycle order
    CircularDependency(Vec<String>),
    /// The plugin cannot be activated while the host is running
    RestartRequired,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::WrongPlatform { required } => write!(f, "only available on {}", required),
            RejectReason::RuntimeTooOld { required, current } => {
                write!(f, "requires runtime version {} (running {})", required, current)
            }
            RejectReason::VersionTooOld { required, current } => {
                write!(f, "requires host version {} (running {})", required, current)
            }
            RejectReason::MissingDependency(names) => {
                write!(f, "requires plugins that are not loaded: {}", names.join(", "))
            }
            RejectReason::CircularDependency(cycle) => {
                write!(f, "circular dependency: {}", cycle.join(" -> "))
            }
            RejectReason::RestartRequired => write!(f, "will be activated after a restart"),
        }
    }
}

/// Finds the plugin in `plugins` that satisfies `requirement`, ignoring `requester`
pub fn find_provider<'a>(
    requirement: &str,
    requester: &str,
    plugins: &'a [PluginMetadata],
) -> Option<&'a PluginMetadata> {
    plugins
        .iter()
        .filter(|p| p.name() != requester)
        .find(|p| p.name() == requirement)
        .or_else(|| {
            plugins
                .iter()
                .filter(|p| p.name() != requester)
                .find(|p| p.satisfies(requirement))
        })
}

/// Returns every dependency cycle among `plugins`.
///
/// Edges are `requires` entries resolved within `plugins` (by name or
/// provided capability). Each cycle is listed once, starting from the plugin
/// the search reached first.
pub fn detect_cycles(plugins: &[PluginMetadata]) -> Vec<Vec<String>> {
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for plugin in plugins {
        let targets = plugin
            .requires
            .iter()
            .filter_map(|r| find_provider(r, plugin.name(), plugins))
            .map(|p| p.name())
            .collect();
        edges.insert(plugin.name(), targets);
    }

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        visiting: &mut HashSet<&'a str>,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visiting.insert(node);
        path.push(node);

        for &next in edges.get(node).map(Vec::as_slice).unwrap_or_default() {
            if visiting.contains(next) {
                let start = path.iter().position(|&p| p == next).unwrap_or(0);
                cycles.push(path[start..].iter().map(|s| s.to_string()).collect());
            } else if !visited.contains(next) {
                visit(next, edges, visiting, visited, path, cycles);
            }
        }

        path.pop();
        visiting.remove(node);
        visited.insert(node);
    }

    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    let mut cycles = Vec::new();
    for plugin in plugins {
        if !visited.contains(plugin.name()) {
            let mut path = Vec::new();
            visit(plugin.name(), &edges, &mut visiting, &mut visited, &mut path, &mut cycles);
        }
    }
    cycles
}
