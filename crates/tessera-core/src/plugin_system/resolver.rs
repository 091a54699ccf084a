//! # Tessera Core Dependency Resolver
//!
//! Decides which plugins of a load set may be loaded and in which order.
//!
//! ## Checks
//!
//! Each candidate must pass, in order:
//! - its platform restriction
//! - its minimum runtime version
//! - its minimum host version (an unknown host passes)
//! - its `requires` list against the other candidates and the active modules
//!
//! Rejecting a plugin can break plugins that require it, so checks repeat
//! until the load set is stable. Dependency cycles reject every member.
//!
//! ## Ordering
//!
//! Scheduled plugins are sorted by `stage` only (stable, so ties keep load set
//! order). A dependency with a higher stage than its dependent is reported as
//! a warning, not reordered.
use crate::kernel::environment::HostEnvironment;
use crate::plugin_system::dependency::{RejectReason, detect_cycles, find_provider};
use crate::plugin_system::metadata::PluginMetadata;

/// Result of resolving one load set
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Plugins that passed every check, in load order
    pub scheduled: Vec<PluginMetadata>,
    pub rejected: Vec<(String, RejectReason)>,
    /// Dependencies that load after their dependent
    pub stage_warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DependencyResolver {
    env: HostEnvironment,
}

impl DependencyResolver {
    pub fn new(env: HostEnvironment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    /// Checks one plugin against the host and the plugins available to it.
    ///
    /// `scheduled` is the current load set, `active` the modules loaded by an
    /// earlier pass. A requirement must be met by one of those, not merely be
    /// known to the catalog.
    pub fn check_preconditions(
        &self,
        plugin: &PluginMetadata,
        scheduled: &[PluginMetadata],
        active: &[PluginMetadata],
    ) -> Result<(), RejectReason> {
        if !plugin.is_applicable_to_platform(self.env.platform) {
            return Err(RejectReason::WrongPlatform {
                required: plugin.platform.clone().unwrap_or_default(),
            });
        }
        if plugin.min_runtime_version > self.env.runtime_version {
            return Err(RejectReason::RuntimeTooOld {
                required: plugin.min_runtime_version,
                current: self.env.runtime_version,
            });
        }
        if !self.env.host_version.satisfies(plugin.min_host_version) {
            return Err(RejectReason::VersionTooOld {
                required: plugin.min_host_version,
                current: self.env.host_version.known().unwrap_or_default(),
            });
        }

        let missing: Vec<String> = plugin
            .requires
            .iter()
            .filter(|requirement| {
                requirement.as_str() == plugin.name()
                    || (find_provider(requirement, plugin.name(), scheduled).is_none()
                        && find_provider(requirement, plugin.name(), active).is_none())
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(RejectReason::MissingDependency(missing));
        }
        Ok(())
    }

    /// Stable sort by stage
    pub fn order(&self, mut candidates: Vec<PluginMetadata>) -> Vec<PluginMetadata> {
        candidates.sort_by_key(|p| p.stage);
        candidates
    }

    /// Checks, prunes and orders a load set
    pub fn resolve(&self, candidates: Vec<PluginMetadata>, active: &[PluginMetadata]) -> Resolution {
        let mut scheduled: Vec<PluginMetadata> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if scheduled.iter().any(|p| p.name() == candidate.name()) {
                log::debug!("Ignoring duplicate load request for '{}'", candidate.name());
                continue;
            }
            scheduled.push(candidate);
        }

        let mut rejected = Vec::new();
        self.prune(&mut scheduled, active, &mut rejected);

        let cycles = detect_cycles(&scheduled);
        if !cycles.is_empty() {
            for cycle in cycles {
                for name in &cycle {
                    if let Some(index) = scheduled.iter().position(|p| p.name() == name) {
                        scheduled.remove(index);
                        log::warn!("Rejecting plugin '{}': circular dependency {}", name, cycle.join(" -> "));
                        rejected.push((name.clone(), RejectReason::CircularDependency(cycle.clone())));
                    }
                }
            }
            self.prune(&mut scheduled, active, &mut rejected);
        }

        let stage_warnings = stage_warnings(&scheduled);
        for warning in &stage_warnings {
            log::warn!("{}", warning);
        }

        Resolution {
            scheduled: self.order(scheduled),
            rejected,
            stage_warnings,
        }
    }

    fn prune(
        &self,
        scheduled: &mut Vec<PluginMetadata>,
        active: &[PluginMetadata],
        rejected: &mut Vec<(String, RejectReason)>,
    ) {
        loop {
            let failure = scheduled.iter().enumerate().find_map(|(index, plugin)| {
                self.check_preconditions(plugin, scheduled, active)
                    .err()
                    .map(|reason| (index, reason))
            });
            let Some((index, reason)) = failure else {
                break;
            };
            let plugin = scheduled.remove(index);
            log::warn!("Rejecting plugin '{}': {}", plugin.name(), reason);
            rejected.push((plugin.name().to_string(), reason));
        }
    }
}

fn stage_warnings(scheduled: &[PluginMetadata]) -> Vec<String> {
    let mut warnings = Vec::new();
    for plugin in scheduled {
        for requirement in &plugin.requires {
            if let Some(dependency) = find_provider(requirement, plugin.name(), scheduled) {
                if dependency.stage > plugin.stage {
                    warnings.push(format!(
                        "Plugin '{}' (stage {}) requires '{}' which loads later (stage {})",
                        plugin.name(),
                        plugin.stage,
                        dependency.name(),
                        dependency.stage
                    ));
                }
            }
        }
    }
    warnings
}
