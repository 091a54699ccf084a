//! Downloading plugin artifacts into the staging area.
//!
//! Downloads land at `<name>.tpk.new`. Nothing here touches an installed
//! artifact; [`PluginDirectory::install_staged`] swaps staged files into place
//! once the whole batch is over.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::kernel::environment::HostEnvironment;
use crate::plugin_system::metadata::PluginMetadata;
use crate::storage::local::PluginDirectory;
use crate::transport::client::HttpSource;
use crate::transport::error::TransportError;
use crate::ui_bridge::{ConfirmRequest, HostUi};

/// State of one download attempt
#[derive(Debug, Clone)]
pub struct ArtifactFetchJob {
    pub target: PluginMetadata,
    /// Staging path the download is written to
    pub destination: PathBuf,
    pub cancel: CancellationToken,
    pub last_error: Option<String>,
}

impl ArtifactFetchJob {
    pub fn new(target: PluginMetadata, destination: PathBuf, cancel: CancellationToken) -> Self {
        Self { target, destination, cancel, last_error: None }
    }
}

/// Outcome of a batch download
#[derive(Debug, Default)]
pub struct BatchReport {
    pub downloaded: Vec<PluginMetadata>,
    /// Staged files written by this batch
    pub staged: Vec<PathBuf>,
    pub failed: Vec<(String, TransportError)>,
    pub cancelled: bool,
}

impl BatchReport {
    /// Deletes the staged files so nothing from this batch gets installed
    pub async fn discard(self) {
        for path in self.staged {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                log::warn!("Failed to discard {}: {}", path.display(), e);
            }
        }
    }
}

#[derive(Clone)]
pub struct PluginArtifactFetcher {
    http: Arc<dyn HttpSource>,
    directory: PluginDirectory,
    env: HostEnvironment,
    ui: Arc<dyn HostUi>,
}

impl PluginArtifactFetcher {
    pub fn new(
        http: Arc<dyn HttpSource>,
        directory: PluginDirectory,
        env: HostEnvironment,
        ui: Arc<dyn HostUi>,
    ) -> Self {
        Self { http, directory, env, ui }
    }

    /// Description of the version requirement `plugin` fails, if any
    pub fn version_requirement(&self, plugin: &PluginMetadata) -> Option<String> {
        if plugin.min_runtime_version > self.env.runtime_version {
            return Some(format!(
                "requires runtime version {} (running {})",
                plugin.min_runtime_version, self.env.runtime_version
            ));
        }
        if self.env.host_version.satisfies(plugin.min_host_version) {
            return None;
        }
        Some(format!(
            "requires host version {} (running {})",
            plugin.min_host_version, self.env.host_version
        ))
    }

    /// Lets the user override a failed version requirement.
    ///
    /// Only an explicit yes lets the download proceed.
    pub fn check_version_gate(&self, plugin: &PluginMetadata) -> Result<(), TransportError> {
        let Some(requirement) = self.version_requirement(plugin) else {
            return Ok(());
        };
        let request = ConfirmRequest::DownloadDespiteVersion {
            plugin: plugin.name().to_string(),
            requirement: requirement.clone(),
        };
        match self.ui.confirm(&request) {
            Some(true) => {
                log::info!("Downloading '{}' although it {}", plugin.name(), requirement);
                Ok(())
            }
            _ => Err(TransportError::VersionGateRejected {
                plugin: plugin.name().to_string(),
                requirement,
            }),
        }
    }

    /// Downloads `plugin` to `destination` after passing the version gate
    pub async fn fetch_artifact(
        &self,
        plugin: &PluginMetadata,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<u64, TransportError> {
        self.check_version_gate(plugin)?;
        let url = plugin
            .download_location
            .as_ref()
            .ok_or_else(|| TransportError::MissingDownloadLocation(plugin.name().to_string()))?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransportError::io(e, "create_dir_all", parent.to_path_buf()))?;
        }
        log::info!("Downloading plugin '{}' from {}", plugin.name(), url);
        let bytes = self.http.fetch_to_file(url, destination, cancel).await?;
        log::debug!("Downloaded {} bytes for '{}'", bytes, plugin.name());
        Ok(bytes)
    }

    /// Runs one job, recording its error
    pub async fn run_job(&self, job: &mut ArtifactFetchJob) -> Result<u64, TransportError> {
        let result = self.fetch_artifact(&job.target, &job.destination, &job.cancel).await;
        if let Err(e) = &result {
            job.last_error = Some(e.to_string());
        }
        result
    }

    /// Downloads every plugin into its staging path.
    ///
    /// A failed download does not stop the batch. Cancellation stops it
    /// before the next plugin and keeps what was already downloaded.
    pub async fn fetch_batch(&self, plugins: Vec<PluginMetadata>, cancel: &CancellationToken) -> BatchReport {
        let mut report = BatchReport::default();
        for plugin in plugins {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let destination = self.directory.staged_path(plugin.name());
            let mut job = ArtifactFetchJob::new(plugin, destination, cancel.child_token());
            match self.run_job(&mut job).await {
                Ok(_) => {
                    report.staged.push(job.destination);
                    report.downloaded.push(job.target);
                }
                Err(TransportError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    log::warn!("Failed to download plugin '{}': {}", job.target.name(), e);
                    report.failed.push((job.target.name().to_string(), e));
                }
            }
        }
        report
    }
}
