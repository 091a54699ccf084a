//! Downloading and caching remote plugin lists.
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::kernel::environment::HostVersion;
use crate::plugin_system::listing::parse_listing;
use crate::plugin_system::metadata::PluginMetadata;
use crate::storage::local::PluginDirectory;
use crate::transport::client::HttpSource;
use crate::transport::error::TransportError;
use crate::transport::site::{cache_file_name, display_site, expand_site};
use crate::utils::fs::file_name_str;

/// Plugins gathered from a set of sites
#[derive(Debug, Default)]
pub struct CatalogFetch {
    pub plugins: Vec<PluginMetadata>,
    /// Sites that could not be downloaded or parsed, with the error
    pub failed_sites: Vec<(String, TransportError)>,
    pub cancelled: bool,
}

#[derive(Clone)]
pub struct PluginListFetcher {
    http: Arc<dyn HttpSource>,
    directory: PluginDirectory,
    host: HostVersion,
    requested: Vec<String>,
    deprecated: HashSet<String>,
}

impl PluginListFetcher {
    pub fn new(http: Arc<dyn HttpSource>, directory: PluginDirectory, host: HostVersion) -> Self {
        Self {
            http,
            directory,
            host,
            requested: Vec::new(),
            deprecated: HashSet::new(),
        }
    }

    /// Plugin names used to fill `%<prefix>` site templates
    pub fn with_requested_plugins(mut self, names: Vec<String>) -> Self {
        self.requested = names;
        self
    }

    /// Names dropped from every fetched list
    pub fn with_deprecated(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.deprecated = names.into_iter().collect();
        self
    }

    /// Downloads every site, caches the raw text and parses it.
    ///
    /// A site that fails is recorded and skipped. When every site was
    /// visited, cache files belonging to no configured site are removed.
    pub async fn fetch_catalog(&self, sites: &[String], cancel: &CancellationToken) -> CatalogFetch {
        let mut fetch = CatalogFetch::default();
        let current: HashSet<String> = sites.iter().map(|s| cache_file_name(s)).collect();

        for site in sites {
            if cancel.is_cancelled() {
                fetch.cancelled = true;
                break;
            }
            let shown = display_site(site);
            let expanded = expand_site(site, &self.requested);
            let url = match Url::parse(&expanded) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("Skipping plugin site '{}': {}", shown, e);
                    fetch.failed_sites.push((shown, TransportError::InvalidUrl { url: expanded, reason: e.to_string() }));
                    continue;
                }
            };

            let text = match self.http.fetch_text(&url, cancel).await {
                Ok(text) => text,
                Err(TransportError::Cancelled) => {
                    fetch.cancelled = true;
                    break;
                }
                Err(e) => {
                    log::warn!("Failed to download plugin list from '{}': {}", shown, e);
                    fetch.failed_sites.push((shown, e));
                    continue;
                }
            };

            if let Err(e) = self.write_cache(site, &text).await {
                log::warn!("Failed to cache plugin list from '{}': {}", shown, e);
            }
            match self.parse_site(&shown, &text) {
                Ok(plugins) => fetch.plugins.extend(plugins),
                Err(e) => {
                    log::warn!("{}", e);
                    fetch.failed_sites.push((shown, e));
                }
            }
        }

        if !fetch.cancelled {
            self.remove_stale_caches(&current).await;
        }
        fetch
    }

    /// Parses the cached copies of `sites` without touching the network
    pub async fn read_cached(&self, sites: &[String]) -> CatalogFetch {
        let mut fetch = CatalogFetch::default();
        for site in sites {
            let shown = display_site(site);
            let path = self.directory.cache_path(&cache_file_name(site));
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    fetch.failed_sites.push((shown, TransportError::io(e, "read_site_cache", path)));
                    continue;
                }
            };
            match self.parse_site(&shown, &text) {
                Ok(plugins) => fetch.plugins.extend(plugins),
                Err(e) => fetch.failed_sites.push((shown, e)),
            }
        }
        fetch
    }

    /// Serves cached lists when every site has one, unless `force_refresh`
    pub async fn fetch_or_cached(
        &self,
        sites: &[String],
        force_refresh: bool,
        cancel: &CancellationToken,
    ) -> CatalogFetch {
        if !force_refresh {
            let cached = self.read_cached(sites).await;
            if cached.failed_sites.is_empty() {
                return cached;
            }
            log::debug!("{} site cache(s) unusable, downloading", cached.failed_sites.len());
        }
        self.fetch_catalog(sites, cancel).await
    }

    fn parse_site(&self, shown: &str, text: &str) -> Result<Vec<PluginMetadata>, TransportError> {
        let entries = parse_listing(shown, text).map_err(TransportError::ListParse)?;
        Ok(entries
            .into_iter()
            .filter(|p| {
                let keep = !self.deprecated.contains(p.name());
                if !keep {
                    log::debug!("Dropping deprecated plugin '{}' from '{}'", p.name(), shown);
                }
                keep
            })
            .map(|mut p| {
                p.select_download_for_host(self.host);
                p
            })
            .collect())
    }

    async fn write_cache(&self, site: &str, text: &str) -> Result<(), TransportError> {
        let root = self.directory.root().to_path_buf();
        let target = self.directory.cache_path(&cache_file_name(site));
        let text = text.to_string();
        tokio::task::spawn_blocking(move || write_atomically(&root, &target, &text))
            .await
            .map_err(|e| TransportError::Worker(e.to_string()))?
    }

    async fn remove_stale_caches(&self, current: &HashSet<String>) {
        for path in self.directory.site_caches().await {
            if is_current(&path, current) {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => log::debug!("Removed stale plugin list cache {}", path.display()),
                Err(e) => log::warn!("Failed to remove stale plugin list cache {}: {}", path.display(), e),
            }
        }
    }
}

/// Replaces `target` with `text` through a temporary file in `root`
fn write_atomically(root: &Path, target: &Path, text: &str) -> Result<(), TransportError> {
    std::fs::create_dir_all(root).map_err(|e| TransportError::io(e, "create_dir_all", root.to_path_buf()))?;
    let mut temp_file =
        NamedTempFile::new_in(root).map_err(|e| TransportError::io(e, "create_temp_file", root.to_path_buf()))?;
    temp_file
        .write_all(text.as_bytes())
        .map_err(|e| TransportError::io(e, "write_site_cache", temp_file.path().to_path_buf()))?;
    temp_file
        .persist(target)
        .map_err(|e| TransportError::io(e.error, "persist_site_cache", target.to_path_buf()))?;
    Ok(())
}

fn is_current(path: &Path, current: &HashSet<String>) -> bool {
    file_name_str(path).is_some_and(|name| current.contains(name))
}
