//! # Tessera Core Plugin Orchestrator
//!
//! [`PluginOrchestrator`] drives the plugin core end to end:
//!
//! - **Load set**: configured plugins plus the `TESSERA_PLUGINS` override,
//!   without deprecated and (after confirmation) unmaintained names, looked up
//!   in a catalog built from the plugin directory.
//! - **Loading**: one [`load_all`](PluginOrchestrator::load_all) call per pass.
//!   The very-early, early and late passes run one after another so modules of
//!   an earlier pass are active before later preconditions are checked.
//! - **Updating**: list refresh and artifact downloads run on the
//!   [`BackgroundWorker`]; the catalog is only touched once a job finished.
//! - **After startup**: plugins enabled later only activate if they declare
//!   `Plugin-Canloadatruntime`. A failure pinned on a plugin can be answered
//!   with an update, a disable or nothing.
//!
//! Problems are reported to the host in batches through [`HostUi`]. The only
//! fatal condition is a plugin directory that cannot be created or written.
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::kernel::constants::PLUGINS_ENV_VAR;
use crate::kernel::environment::HostEnvironment;
use crate::kernel::error::Result;
use crate::plugin_system::artifact::read_artifact_metadata;
use crate::plugin_system::catalog::{PluginCatalog, Source};
use crate::plugin_system::dependency::{RejectReason, find_provider};
use crate::plugin_system::error::LoadFailure;
use crate::plugin_system::library::{LibraryProvider, StaticLibraries};
use crate::plugin_system::loader::ModuleLoader;
use crate::plugin_system::metadata::PluginMetadata;
use crate::plugin_system::registry::{ModuleHandle, ModuleRegistry};
use crate::plugin_system::resolver::{DependencyResolver, Resolution};
use crate::plugin_system::scope::SymbolTable;
use crate::plugin_system::traits::HostEvent;
use crate::plugin_system::update_policy::{UpdatePolicy, unix_now};
use crate::storage::config::PluginConfig;
use crate::storage::local::PluginDirectory;
use crate::transport::artifact::PluginArtifactFetcher;
use crate::transport::client::{HttpClient, HttpSource};
use crate::transport::list::PluginListFetcher;
use crate::transport::worker::BackgroundWorker;
use crate::ui_bridge::{ConfirmRequest, FailureAction, FailureRequest, HeadlessUi, HostUi, Notice};

/// Result of one loading pass
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub loaded: Vec<Arc<ModuleHandle>>,
    pub rejected: Vec<(String, RejectReason)>,
    pub failed: Vec<LoadFailure>,
}

impl LoadOutcome {
    /// Appends the results of a later pass
    pub fn extend(&mut self, other: LoadOutcome) {
        self.loaded.extend(other.loaded);
        self.rejected.extend(other.rejected);
        self.failed.extend(other.failed);
    }

    pub fn loaded_names(&self) -> Vec<&str> {
        self.loaded.iter().map(|m| m.name()).collect()
    }
}

/// Result of [`PluginOrchestrator::update_plugins`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Plugins whose new artifact is now installed
    pub updated: Vec<String>,
    /// Plugins that could not be downloaded or installed, with the reason
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
}

/// What [`PluginOrchestrator::handle_plugin_failure`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureResolution {
    /// The failure is not attributed to a plugin; nothing was asked
    NotAttributed,
    Kept,
    Disabled,
    Updated(UpdateOutcome),
}

/// Which loading pass a plugin belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPass {
    VeryEarly,
    Early,
    Late,
}

impl LoadPass {
    pub const ALL: [LoadPass; 3] = [LoadPass::VeryEarly, LoadPass::Early, LoadPass::Late];

    pub fn of(plugin: &PluginMetadata) -> Self {
        match (plugin.load_early, plugin.stage < 0) {
            (true, true) => LoadPass::VeryEarly,
            (true, false) => LoadPass::Early,
            (false, _) => LoadPass::Late,
        }
    }

    pub fn select(self, plugins: &[PluginMetadata]) -> Vec<PluginMetadata> {
        plugins.iter().filter(|p| LoadPass::of(p) == self).cloned().collect()
    }
}

impl fmt::Display for LoadPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadPass::VeryEarly => write!(f, "very early"),
            LoadPass::Early => write!(f, "early"),
            LoadPass::Late => write!(f, "late"),
        }
    }
}

pub struct OrchestratorBuilder {
    config: PluginConfig,
    config_path: Option<PathBuf>,
    ui: Arc<dyn HostUi>,
    http: Option<Arc<dyn HttpSource>>,
    libraries: Arc<dyn LibraryProvider>,
    host_symbols: SymbolTable,
    plugin_override: Option<String>,
}

impl OrchestratorBuilder {
    fn new(config: PluginConfig) -> Self {
        Self {
            config,
            config_path: None,
            ui: Arc::new(HeadlessUi),
            http: None,
            libraries: Arc::new(StaticLibraries::new()),
            host_symbols: SymbolTable::new(),
            plugin_override: std::env::var(PLUGINS_ENV_VAR).ok(),
        }
    }

    /// File the configuration is saved back to after a confirmed removal
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn ui(mut self, ui: Arc<dyn HostUi>) -> Self {
        self.ui = ui;
        self
    }

    pub fn http(mut self, http: Arc<dyn HttpSource>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn libraries(mut self, libraries: Arc<dyn LibraryProvider>) -> Self {
        self.libraries = libraries;
        self
    }

    /// Symbols every plugin scope falls back to
    pub fn host_symbols(mut self, symbols: SymbolTable) -> Self {
        self.host_symbols = symbols;
        self
    }

    /// Replaces the comma-separated list read from `TESSERA_PLUGINS`
    pub fn plugin_override(mut self, names: Option<String>) -> Self {
        self.plugin_override = names;
        self
    }

    pub fn build(self) -> Result<PluginOrchestrator> {
        let http = match self.http {
            Some(http) => http,
            None => Arc::new(HttpClient::new()?),
        };

        // A relative plugin directory lives next to the configuration file
        let mut plugin_dir = self.config.plugin_dir.clone();
        if plugin_dir.is_relative() {
            if let Some(parent) = self.config_path.as_deref().and_then(|p| p.parent()) {
                plugin_dir = parent.join(plugin_dir);
            }
        }

        Ok(PluginOrchestrator {
            env: self.config.environment(),
            config: self.config,
            config_path: self.config_path,
            directory: PluginDirectory::new(plugin_dir),
            catalog: PluginCatalog::new(),
            loader: ModuleLoader::with_host_symbols(self.libraries, self.host_symbols),
            registry: ModuleRegistry::new(),
            not_loaded: Vec::new(),
            load_errors: Vec::new(),
            startup_complete: false,
            ui: self.ui,
            http,
            worker: BackgroundWorker::new(),
            plugin_override: self.plugin_override,
        })
    }
}

pub struct PluginOrchestrator {
    env: HostEnvironment,
    config: PluginConfig,
    config_path: Option<PathBuf>,
    directory: PluginDirectory,
    catalog: PluginCatalog,
    loader: ModuleLoader,
    registry: ModuleRegistry,
    not_loaded: Vec<(String, RejectReason)>,
    load_errors: Vec<LoadFailure>,
    startup_complete: bool,
    ui: Arc<dyn HostUi>,
    http: Arc<dyn HttpSource>,
    worker: BackgroundWorker,
    plugin_override: Option<String>,
}

impl PluginOrchestrator {
    pub fn builder(config: PluginConfig) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.env
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn directory(&self) -> &PluginDirectory {
        &self.directory
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PluginCatalog {
        &mut self.catalog
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// Modules activated so far, in activation order
    pub fn active_modules(&self) -> &[Arc<ModuleHandle>] {
        self.registry.modules()
    }

    /// Every rejection recorded since startup
    pub fn not_loaded(&self) -> &[(String, RejectReason)] {
        &self.not_loaded
    }

    pub fn load_errors(&self) -> &[LoadFailure] {
        &self.load_errors
    }

    /// Marks the startup passes as done.
    ///
    /// From now on [`load_all`](Self::load_all) only activates plugins that
    /// can be loaded at runtime.
    pub fn complete_startup(&mut self) {
        self.startup_complete = true;
    }

    pub fn is_startup_complete(&self) -> bool {
        self.startup_complete
    }

    /// Forwards a host event to every active module
    pub fn notify(&mut self, event: &HostEvent) {
        self.registry.notify(event);
    }

    /// Reads site caches and installed artifacts into the catalog
    pub async fn scan_plugin_directory(&mut self) {
        let dirs = [self.directory.root().to_path_buf()];
        self.catalog.scan_local(&dirs, self.env.host_version).await;
    }

    /// Determines which plugins to load.
    ///
    /// Deprecated names are removed from the configuration, unmaintained ones
    /// only when the user agrees. Names without catalog information are
    /// reported in one notice and left out. Fails only when the plugin
    /// directory cannot be created or written.
    pub async fn build_load_set(&mut self) -> Result<Vec<PluginMetadata>> {
        self.directory.ensure_writable().await?;

        let mut names = self.config.requested_plugins(self.plugin_override.as_deref());

        let removed = PluginCatalog::filter_deprecated(&mut names, &self.config.deprecated_plugins());
        if !removed.is_empty() {
            self.config.remove_plugins(removed.iter().map(|d| d.name.as_str()));
            self.persist_config();
            self.ui.notify(&Notice::DeprecatedRemoved(removed));
        }

        let ui = self.ui.clone();
        let disabled = PluginCatalog::filter_unmaintained(&mut names, &self.config.unmaintained_plugins(), |name| {
            ui.confirm(&ConfirmRequest::DisableUnmaintained { plugin: name.to_string() })
        });
        if !disabled.is_empty() {
            self.config.remove_plugins(disabled.iter().map(String::as_str));
            self.persist_config();
        }

        self.scan_plugin_directory().await;

        let mut load_set = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            if self.registry.get(&name).is_some() {
                continue;
            }
            match self.catalog.lookup(&name) {
                Some(metadata) if self.catalog.is_installed(&name) => load_set.push(metadata.clone()),
                _ => missing.push(name),
            }
        }
        if !missing.is_empty() {
            log::warn!("No plugin information found for: {}", missing.join(", "));
            self.ui.notify(&Notice::MissingPluginInformation(missing));
        }
        Ok(load_set)
    }

    /// Dry run of [`load_all`](Self::load_all) against the active modules
    pub fn plan(&self, load_set: Vec<PluginMetadata>) -> Resolution {
        DependencyResolver::new(self.env.clone()).resolve(load_set, &self.registry.active_metadata())
    }

    /// Validates, orders and activates `load_set`.
    ///
    /// Preconditions are checked against the modules activated by earlier
    /// calls; plugins already active are skipped. After startup a plugin
    /// without `Plugin-Canloadatruntime` is rejected until the next start.
    /// A plugin that fails to instantiate does not stop the others; the user
    /// may disable it permanently.
    pub fn load_all(&mut self, load_set: Vec<PluginMetadata>) -> LoadOutcome {
        let mut deferred = Vec::new();
        let mut candidates = Vec::with_capacity(load_set.len());
        for plugin in load_set {
            if self.registry.get(plugin.name()).is_some() {
                log::debug!("Plugin '{}' is already active", plugin.name());
            } else if self.startup_complete && !plugin.loadable_at_runtime {
                log::info!("Plugin '{}' will be activated after a restart", plugin.name());
                deferred.push((plugin.name().to_string(), RejectReason::RestartRequired));
            } else {
                candidates.push(plugin);
            }
        }
        let resolution = self.plan(candidates);

        let mut scoped = Vec::with_capacity(resolution.scheduled.len());
        for plugin in &resolution.scheduled {
            let scope = self.loader.build_scope(plugin, &[]);
            scoped.push((plugin, scope));
        }

        for (plugin, scope) in &scoped {
            for requirement in &plugin.requires {
                let dependency = find_provider(requirement, plugin.name(), &resolution.scheduled)
                    .and_then(|provider| self.loader.scope_of(provider.name()))
                    .or_else(|| {
                        self.registry
                            .modules()
                            .iter()
                            .find(|m| m.name() != plugin.name() && m.metadata().satisfies(requirement))
                            .map(|m| m.scope())
                    });
                match dependency {
                    Some(dependency) => {
                        self.loader.add_dependency(*scope, dependency);
                    }
                    None => log::error!(
                        "Unable to find scope of dependency '{}' for plugin '{}'",
                        requirement,
                        plugin.name()
                    ),
                }
            }
        }

        let mut outcome = LoadOutcome::default();
        for (plugin, scope) in scoped {
            match self.loader.instantiate(plugin, scope) {
                Ok(handle) => match self.registry.register(handle) {
                    Ok(module) => {
                        self.catalog.mark_active(module.metadata());
                        outcome.loaded.push(module);
                    }
                    Err(e) => outcome.failed.push(LoadFailure::Internal { message: e.to_string() }),
                },
                Err(failure) => {
                    self.offer_disable(&failure);
                    outcome.failed.push(failure);
                }
            }
        }

        outcome.rejected = deferred;
        outcome.rejected.extend(resolution.rejected);
        if !outcome.rejected.is_empty() {
            self.not_loaded.extend(outcome.rejected.iter().cloned());
            self.ui.notify(&Notice::PluginsRejected(outcome.rejected.clone()));
        }

        let internal: Vec<LoadFailure> = outcome.failed.iter().filter(|f| !f.is_attributed()).cloned().collect();
        if !internal.is_empty() {
            self.ui.notify(&Notice::LoadFailed(internal));
        }
        self.load_errors.extend(outcome.failed.iter().cloned());
        outcome
    }

    fn offer_disable(&mut self, failure: &LoadFailure) {
        log::error!("{}", failure);
        let LoadFailure::Attributed { plugin, cause } = failure else {
            return;
        };
        let request = ConfirmRequest::DisableAfterLoadFailure {
            plugin: plugin.clone(),
            cause: cause.to_string(),
        };
        if self.ui.confirm(&request) == Some(true) && self.config.remove_plugin(plugin) {
            log::info!("Disabled plugin '{}'", plugin);
            self.persist_config();
        }
    }

    /// Runs [`load_all`](Self::load_all) for the plugins of `pass`
    pub fn load_pass(&mut self, pass: LoadPass, load_set: &[PluginMetadata]) -> LoadOutcome {
        let plugins = pass.select(load_set);
        log::debug!("Loading {} plugins in the {} pass", plugins.len(), pass);
        self.load_all(plugins)
    }

    /// Plugins that are early and have a negative stage
    pub fn load_very_early(&mut self, load_set: &[PluginMetadata]) -> LoadOutcome {
        self.load_pass(LoadPass::VeryEarly, load_set)
    }

    pub fn load_early(&mut self, load_set: &[PluginMetadata]) -> LoadOutcome {
        self.load_pass(LoadPass::Early, load_set)
    }

    pub fn load_late(&mut self, load_set: &[PluginMetadata]) -> LoadOutcome {
        self.load_pass(LoadPass::Late, load_set)
    }

    /// Builds the load set and runs every pass in order
    pub async fn load_plugins(&mut self) -> Result<LoadOutcome> {
        let load_set = self.build_load_set().await?;
        let mut outcome = LoadOutcome::default();
        for pass in LoadPass::ALL {
            outcome.extend(self.load_pass(pass, &load_set));
        }
        self.complete_startup();
        Ok(outcome)
    }

    /// Enables `names` in the configuration and activates them now.
    ///
    /// Names with no installed artifact are reported in one notice; they stay
    /// enabled and load once installed.
    pub async fn enable_plugins(&mut self, names: &[String]) -> Result<LoadOutcome> {
        self.directory.ensure_writable().await?;
        let mut added = false;
        for name in names {
            added |= self.config.add_plugin(name);
        }
        if added {
            self.persist_config();
        }

        self.scan_plugin_directory().await;
        let mut load_set = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match self.catalog.lookup(name) {
                Some(metadata) if self.catalog.is_installed(name) => load_set.push(metadata.clone()),
                _ => missing.push(name.clone()),
            }
        }
        if !missing.is_empty() {
            self.ui.notify(&Notice::MissingPluginInformation(missing));
        }
        Ok(self.load_all(load_set))
    }

    /// Lets the user update, disable or keep the plugin `failure` is pinned on.
    ///
    /// Works for load failures and for errors the host traced back to a
    /// plugin at run time. No answer keeps the plugin.
    pub async fn handle_plugin_failure(
        &mut self,
        failure: &LoadFailure,
        cancel: &CancellationToken,
    ) -> Result<FailureResolution> {
        let LoadFailure::Attributed { plugin, cause } = failure else {
            log::error!("{}", failure);
            return Ok(FailureResolution::NotAttributed);
        };
        let request = FailureRequest {
            plugin: plugin.clone(),
            cause: cause.to_string(),
            update_available: self.catalog.lookup(plugin).is_some_and(|p| p.has_newer_advertised()),
        };
        match self.ui.choose_failure_action(&request) {
            Some(FailureAction::Update) => {
                log::info!("Updating plugin '{}' after a failure", plugin);
                let outcome = self.update_plugins(Some(std::slice::from_ref(plugin)), cancel).await?;
                Ok(FailureResolution::Updated(outcome))
            }
            Some(FailureAction::Disable) => {
                if self.config.remove_plugin(plugin) {
                    log::info!("Disabled plugin '{}'", plugin);
                    self.persist_config();
                }
                Ok(FailureResolution::Disabled)
            }
            Some(FailureAction::Keep) | None => Ok(FailureResolution::Kept),
        }
    }

    /// Downloads and installs newer artifacts.
    ///
    /// `targets` limits the update to the named plugins, which need not be
    /// installed yet; `None` updates every configured plugin. Required
    /// plugins that are not installed are downloaded as well. Artifacts that
    /// downloaded before a failure or a cancellation are still installed.
    pub async fn update_plugins(
        &mut self,
        targets: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> Result<UpdateOutcome> {
        self.directory.ensure_writable().await?;
        self.scan_plugin_directory().await;

        if !self.refresh_plugin_list(true, cancel).await? {
            return Ok(UpdateOutcome { cancelled: true, ..Default::default() });
        }

        let candidates: Vec<String> = match targets {
            Some(names) => names.to_vec(),
            None => self.build_load_set().await?.iter().map(|p| p.name().to_string()).collect(),
        };
        let selected = self.select_downloads(&candidates);
        if selected.is_empty() {
            log::info!("All plugins are up to date");
            if targets.is_none() {
                self.record_full_update();
            }
            return Ok(UpdateOutcome::default());
        }

        let names: Vec<&str> = selected.iter().map(|p| p.name()).collect();
        log::info!("Updating plugins: {}", names.join(", "));
        let fetcher = PluginArtifactFetcher::new(self.http.clone(), self.directory.clone(), self.env.clone(), self.ui.clone());
        let job = self
            .worker
            .submit_with(cancel.child_token(), move |token| async move { fetcher.fetch_batch(selected, &token).await });
        let report = job.wait().await?;

        let install = self.directory.install_staged().await;
        for name in &install.installed {
            let path = self.directory.artifact_path(name);
            match read_artifact_metadata(&path).await {
                Ok(installed) => self.refresh_installed(installed),
                Err(e) => log::warn!("Cannot read installed plugin '{}': {}", name, e),
            }
        }

        let mut failed: Vec<(String, String)> =
            report.failed.iter().map(|(name, e)| (name.clone(), e.to_string())).collect();
        failed.extend(install.skipped);
        if !failed.is_empty() {
            self.ui.notify(&Notice::UpdateFailed(failed.clone()));
        } else if targets.is_none() && !report.cancelled {
            self.record_full_update();
        }

        Ok(UpdateOutcome {
            updated: install.installed,
            failed,
            cancelled: report.cancelled,
        })
    }

    /// Reads the configured site lists on the worker and merges them into
    /// the catalog.
    ///
    /// Cached lists are used when every site has one, unless `force`.
    /// Returns `false` if the download was cancelled, in which case the
    /// catalog is unchanged.
    pub async fn refresh_plugin_list(&mut self, force: bool, cancel: &CancellationToken) -> Result<bool> {
        let sites = self.config.sites.clone();
        let fetcher = PluginListFetcher::new(self.http.clone(), self.directory.clone(), self.env.host_version)
            .with_requested_plugins(self.config.plugins.clone())
            .with_deprecated(self.config.deprecated_plugins().into_iter().map(|d| d.name));
        let job = self
            .worker
            .submit_with(cancel.child_token(), move |token| async move { fetcher.fetch_or_cached(&sites, force, &token).await });
        let fetch = job.wait().await?;
        if fetch.cancelled {
            log::info!("Plugin list download cancelled");
            return Ok(false);
        }
        self.catalog.merge_remote_list(fetch.plugins);
        Ok(true)
    }

    /// Plugins among `candidates` needing a download, plus missing requirements
    fn select_downloads(&self, candidates: &[String]) -> Vec<PluginMetadata> {
        let mut selected: Vec<PluginMetadata> = Vec::new();
        for name in candidates {
            match self.catalog.lookup(name) {
                Some(plugin) if plugin.is_update_required() => selected.push(plugin.clone()),
                Some(_) => log::debug!("Plugin '{}' is up to date", name),
                None => log::warn!("Plugin '{}' is not offered by any site", name),
            }
        }

        loop {
            let requirements: Vec<String> = selected
                .iter()
                .flat_map(|p| {
                    self.catalog
                        .advertised(p.name())
                        .map_or_else(|| p.requires.clone(), |a| a.requires.clone())
                })
                .collect();

            let mut added = false;
            for requirement in requirements {
                let satisfied = selected.iter().any(|p| p.satisfies(&requirement))
                    || self
                        .catalog
                        .iter()
                        .any(|p| self.catalog.is_installed(p.name()) && p.satisfies(&requirement));
                if satisfied {
                    continue;
                }
                match self.catalog.iter().find(|p| p.satisfies(&requirement) && p.download_location.is_some()) {
                    Some(provider) => {
                        log::info!("Adding required plugin '{}'", provider.name());
                        selected.push(provider.clone());
                        added = true;
                    }
                    None => log::warn!("Required plugin '{}' is not offered by any site", requirement),
                }
            }
            if !added {
                return selected;
            }
        }
    }

    fn refresh_installed(&mut self, installed: PluginMetadata) {
        let name = installed.name().to_string();
        let is_local = self.catalog.entry(&name).is_some_and(|e| e.source >= Source::LocalArtifact);
        match self.catalog.lookup_mut(&name) {
            Some(existing) if is_local => existing.update_from_local(&installed),
            _ => self.catalog.merge(installed, Source::LocalArtifact),
        }
    }

    fn record_full_update(&mut self) {
        self.config.updates.record_update(self.env.host_version, unix_now());
        self.persist_config();
    }

    /// Whether an automatic update should run now.
    ///
    /// A pending trigger is answered by the configured policy; `Ask`
    /// defers to the user.
    pub fn should_update(&mut self) -> bool {
        let before = self.config.updates.clone();
        let pending = self.config.updates.pending_trigger(self.env.host_version, unix_now());
        if self.config.updates != before {
            self.persist_config();
        }
        let Some((trigger, policy)) = pending else {
            return false;
        };
        log::debug!("Plugin update due: {} (policy {:?})", trigger, policy);
        match policy {
            UpdatePolicy::Always => true,
            UpdatePolicy::Never => false,
            UpdatePolicy::Ask => {
                let request = ConfirmRequest::RunUpdate { reason: trigger.to_string() };
                self.ui.confirm(&request) == Some(true)
            }
        }
    }

    /// Configured plugins with their installed version, one per line
    pub fn bug_report_information(&self) -> String {
        let mut lines: Vec<String> = self
            .config
            .plugins
            .iter()
            .map(|name| {
                let version = self
                    .catalog
                    .lookup(name)
                    .and_then(|p| p.local_version.clone().or_else(|| p.version.clone()))
                    .unwrap_or_else(|| "unknown".to_string());
                format!("{} ({})", name, version)
            })
            .collect();
        lines.sort();
        lines.join("\n")
    }

    fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save(path) {
            log::warn!("Failed to save configuration to {}: {}", path.display(), e);
        }
    }
}

impl fmt::Debug for PluginOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOrchestrator")
            .field("env", &self.env)
            .field("plugin_dir", &self.directory.root())
            .field("catalog_entries", &self.catalog.len())
            .field("active_modules", &self.registry.len())
            .finish_non_exhaustive()
    }
}
