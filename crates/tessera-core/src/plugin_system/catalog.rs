//! # Tessera Core Plugin Catalog
//!
//! The merged view of every plugin the host knows about. Entries come from
//! three sources of increasing authority:
//!
//! - **Cached remote listings**: site cache files in the plugin directory.
//! - **Local artifacts**: `*.tpk` files installed in the plugin directory.
//! - **Active modules**: plugins already loaded into this process.
//!
//! A more authoritative entry replaces a weaker one. A remote listing merged
//! under a stronger entry is kept as the *advertised* metadata and only its
//! forward-looking fields (version, description, download location) flow into
//! the entry. Merging the same source twice leaves the catalog unchanged.
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::kernel::environment::HostVersion;
use crate::plugin_system::artifact::read_artifact_metadata;
use crate::plugin_system::deprecation::DeprecatedPlugin;
use crate::plugin_system::listing::parse_listing;
use crate::plugin_system::metadata::PluginMetadata;
use crate::transport::site::is_site_cache_file;
use crate::utils::fs::list_files;

/// Where a catalog entry came from, ordered by authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    CachedRemote,
    LocalArtifact,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub metadata: PluginMetadata,
    pub source: Source,
    /// Remote listing seen for a plugin that is installed or active
    pub advertised: Option<PluginMetadata>,
}

impl CatalogEntry {
    fn refresh_from_site(&mut self) {
        if let Some(advertised) = &self.advertised {
            self.metadata.update_from_site(advertised);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or merges one plugin description from `source`
    pub fn merge(&mut self, metadata: PluginMetadata, source: Source) {
        let Some(entry) = self.entries.get_mut(metadata.name()) else {
            self.entries.insert(
                metadata.name().to_string(),
                CatalogEntry { metadata, source, advertised: None },
            );
            return;
        };

        match (entry.source, source) {
            (existing, incoming) if existing == incoming => {
                entry.metadata.merge_from(&metadata);
                if incoming != Source::CachedRemote {
                    entry.refresh_from_site();
                }
            }
            (existing, Source::CachedRemote) if existing > Source::CachedRemote => {
                entry.advertised = Some(metadata);
                entry.refresh_from_site();
            }
            (Source::CachedRemote, incoming) => {
                let remote = std::mem::replace(&mut entry.metadata, metadata);
                entry.advertised = Some(remote);
                entry.source = incoming;
                entry.refresh_from_site();
            }
            (Source::LocalArtifact, Source::Active) => {
                entry.metadata.merge_from(&metadata);
                entry.source = Source::Active;
                entry.refresh_from_site();
            }
            (existing, incoming) => {
                log::debug!(
                    "Ignoring {:?} metadata for '{}', catalog holds {:?}",
                    incoming,
                    metadata.name(),
                    existing
                );
            }
        }
    }

    /// Merges a fetched remote catalog
    pub fn merge_remote_list(&mut self, entries: impl IntoIterator<Item = PluginMetadata>) {
        for metadata in entries {
            self.merge(metadata, Source::CachedRemote);
        }
    }

    /// Marks a plugin as loaded into the running process
    pub fn mark_active(&mut self, metadata: &PluginMetadata) {
        self.merge(metadata.clone(), Source::Active);
    }

    /// Reads cached site listings, then installed artifacts, from `directories`.
    ///
    /// A file that cannot be read or parsed is logged and skipped. Remote
    /// entries that need a newer host switch to a versioned download link
    /// when one exists for `host`.
    pub async fn scan_local(&mut self, directories: &[PathBuf], host: HostVersion) {
        for dir in directories {
            let files = match list_files(dir).await {
                Ok(files) => files,
                Err(e) => {
                    log::debug!("Skipping plugin directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for path in files.iter().filter(|p| file_name_matches(p, is_site_cache_file)) {
                let text = match tokio::fs::read_to_string(path).await {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("Failed to read plugin list cache {}: {}", path.display(), e);
                        continue;
                    }
                };
                match parse_listing(&path.display().to_string(), &text) {
                    Ok(entries) => {
                        for mut metadata in entries {
                            metadata.select_download_for_host(host);
                            self.merge(metadata, Source::CachedRemote);
                        }
                    }
                    Err(e) => log::warn!("Ignoring plugin list cache {}: {}", path.display(), e),
                }
            }

            for path in files.iter().filter(|p| crate::plugin_system::artifact::artifact_name(p).is_some()) {
                if path.to_string_lossy().ends_with(crate::kernel::constants::STAGED_SUFFIX) {
                    continue;
                }
                match read_artifact_metadata(path).await {
                    Ok(metadata) => self.merge(metadata, Source::LocalArtifact),
                    Err(e) => log::warn!("Skipping plugin artifact {}: {}", path.display(), e),
                }
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&PluginMetadata> {
        self.entries.get(name).map(|e| &e.metadata)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut PluginMetadata> {
        self.entries.get_mut(name).map(|e| &mut e.metadata)
    }

    pub fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    /// Remote listing for `name`, whether or not the plugin is installed
    pub fn advertised(&self, name: &str) -> Option<&PluginMetadata> {
        let entry = self.entries.get(name)?;
        match entry.source {
            Source::CachedRemote => Some(&entry.metadata),
            _ => entry.advertised.as_ref(),
        }
    }

    /// Whether an artifact for `name` is installed locally
    pub fn is_installed(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|e| e.source > Source::CachedRemote || e.metadata.artifact_path.is_some())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginMetadata> {
        self.entries.values().map(|e| &e.metadata)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every requested name on the deprecated list.
    ///
    /// Returns the removed plugins with their deprecation reasons.
    pub fn filter_deprecated(names: &mut Vec<String>, deprecated: &[DeprecatedPlugin]) -> Vec<DeprecatedPlugin> {
        let mut removed = Vec::new();
        names.retain(|name| match deprecated.iter().find(|d| &d.name == name) {
            Some(plugin) => {
                removed.push(plugin.clone());
                false
            }
            None => true,
        });
        removed
    }

    /// Asks `confirm` about every requested unmaintained plugin.
    ///
    /// `Some(true)` drops the plugin, `Some(false)` keeps it. Without an
    /// answer the plugin is kept and a warning is logged. Returns the dropped
    /// names.
    pub fn filter_unmaintained<F>(names: &mut Vec<String>, unmaintained: &[String], confirm: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<bool>,
    {
        let mut removed = Vec::new();
        names.retain(|name| {
            if !unmaintained.contains(name) {
                return true;
            }
            match confirm(name) {
                Some(true) => {
                    removed.push(name.clone());
                    false
                }
                Some(false) => true,
                None => {
                    log::warn!("Plugin '{}' is unmaintained, keeping it", name);
                    true
                }
            }
        });
        removed
    }
}

fn file_name_matches(path: &std::path::Path, predicate: impl Fn(&str) -> bool) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(predicate)
}
