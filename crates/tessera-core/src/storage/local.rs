use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::kernel::constants::{ARTIFACT_EXTENSION, STAGED_SUFFIX};
use crate::plugin_system::artifact::{artifact_name, read_artifact_metadata};
use crate::storage::error::StorageSystemError;
use crate::transport::site::is_site_cache_file;
use crate::utils::fs::{file_name_str, find_files_with_suffix, list_files};

/// Outcome of moving staged downloads into place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    /// Staged artifacts left alone, with the reason
    pub skipped: Vec<(String, String)>,
}

/// The on-disk plugin directory.
///
/// Holds installed artifacts (`<name>.tpk`), staged updates
/// (`<name>.tpk.new`) and cached site listings (`site-*.txt`). The directory
/// is only ever appended to or replaced in; nothing is edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDirectory {
    root: PathBuf,
}

impl PluginDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, ARTIFACT_EXTENSION))
    }

    pub fn staged_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}{}", name, ARTIFACT_EXTENSION, STAGED_SUFFIX))
    }

    pub fn cache_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Creates the directory if needed and proves it accepts new files
    pub async fn ensure_writable(&self) -> Result<(), StorageSystemError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageSystemError::io(e, "create_dir_all", self.root.clone()))?;
        self.probe_writable()
    }

    fn probe_writable(&self) -> Result<(), StorageSystemError> {
        NamedTempFile::new_in(&self.root)
            .map(drop)
            .map_err(|source| StorageSystemError::NotWritable { path: self.root.clone(), source })
    }

    /// Installed artifacts, sorted by path
    pub async fn artifacts(&self) -> Vec<PathBuf> {
        let suffix = format!(".{}", ARTIFACT_EXTENSION);
        find_files_with_suffix(&self.root, &suffix).await.unwrap_or_else(|e| {
            log::warn!("Cannot list {}: {}", self.root.display(), e);
            Vec::new()
        })
    }

    /// Staged downloads waiting for installation
    pub async fn staged(&self) -> Vec<PathBuf> {
        let suffix = format!(".{}{}", ARTIFACT_EXTENSION, STAGED_SUFFIX);
        find_files_with_suffix(&self.root, &suffix).await.unwrap_or_else(|e| {
            log::warn!("Cannot list {}: {}", self.root.display(), e);
            Vec::new()
        })
    }

    /// Cached site listings
    pub async fn site_caches(&self) -> Vec<PathBuf> {
        match list_files(&self.root).await {
            Ok(files) => files
                .into_iter()
                .filter(|p| file_name_str(p).is_some_and(is_site_cache_file))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Moves every valid staged download over its installed artifact.
    ///
    /// A staged file whose metadata block does not parse is left in place and
    /// reported as skipped. A missing or read-only directory installs nothing.
    pub async fn install_staged(&self) -> InstallReport {
        let mut report = InstallReport::default();
        if !tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            log::debug!("Plugin directory {} does not exist, nothing to install", self.root.display());
            return report;
        }
        if let Err(e) = self.probe_writable() {
            log::warn!("Not installing downloaded plugins: {}", e);
            return report;
        }

        for staged in self.staged().await {
            let Some(name) = artifact_name(&staged) else {
                continue;
            };
            if let Err(e) = read_artifact_metadata(&staged).await {
                log::warn!("Not installing downloaded plugin '{}': {}", name, e);
                report.skipped.push((name, e.to_string()));
                continue;
            }
            let target = self.artifact_path(&name);
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                if let Err(e) = tokio::fs::remove_file(&target).await {
                    log::warn!("Cannot replace {}: {}", target.display(), e);
                    report.skipped.push((name, e.to_string()));
                    continue;
                }
            }
            match tokio::fs::rename(&staged, &target).await {
                Ok(()) => {
                    log::info!("Installed plugin '{}'", name);
                    report.installed.push(name);
                }
                Err(e) => {
                    log::warn!("Failed to install plugin '{}': {}", name, e);
                    report.skipped.push((name, e.to_string()));
                }
            }
        }
        report
    }
}
