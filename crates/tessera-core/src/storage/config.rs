use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tempfile::NamedTempFile;

use crate::kernel::constants::{DEFAULT_PLUGIN_SITE, DEFAULT_PLUGINS_DIR};
use crate::kernel::environment::{HostEnvironment, HostVersion, Platform};
use crate::plugin_system::deprecation::{self, DeprecatedPlugin};
use crate::plugin_system::update_policy::UpdateSettings;
use crate::storage::error::StorageSystemError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<String, StorageSystemError> {
        match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value)
                .map_err(|e| StorageSystemError::serialization("json", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(value)
                .map_err(|e| StorageSystemError::serialization("yaml", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(value)
                .map_err(|e| StorageSystemError::serialization("toml", e)),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, StorageSystemError> {
        match self {
            ConfigFormat::Json => serde_json::from_str(text)
                .map_err(|e| StorageSystemError::deserialization("json", e)),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(text)
                .map_err(|e| StorageSystemError::deserialization("yaml", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(text)
                .map_err(|e| StorageSystemError::deserialization("toml", e)),
        }
    }
}

/// Plugin related settings supplied by the host's preferences.
///
/// Table-valued fields come last so the TOML form stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Plugins the user enabled
    pub plugins: Vec<String>,
    /// Plugin list sites, possibly containing a `%<prefix>` template
    pub sites: Vec<String>,
    pub plugin_dir: PathBuf,
    /// Running host version; absent for development builds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_version: Option<u32>,
    /// Platform override, `WINDOWS`, `OSX` or `UNIXOID`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Names added to the built-in unmaintained list
    pub unmaintained: Vec<String>,
    /// Entries added to the built-in deprecated list
    pub deprecated: Vec<DeprecatedPlugin>,
    pub updates: UpdateSettings,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            sites: vec![DEFAULT_PLUGIN_SITE.to_string()],
            plugin_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            host_version: None,
            platform: None,
            unmaintained: Vec::new(),
            deprecated: Vec::new(),
            updates: UpdateSettings::default(),
        }
    }
}

impl PluginConfig {
    /// Reads a configuration file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, StorageSystemError> {
        let format = format_for(path)?;
        let text = std::fs::read_to_string(path)
            .map_err(|e| StorageSystemError::io(e, "read_config", path.to_path_buf()))?;
        format.deserialize(&text)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, StorageSystemError> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Writes the configuration atomically
    pub fn save(&self, path: &Path) -> Result<(), StorageSystemError> {
        let format = format_for(path)?;
        let text = format.serialize(self)?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .map_err(|e| StorageSystemError::io(e, "create_dir_all", parent.clone()))?;
        let mut temp_file = NamedTempFile::new_in(&parent)
            .map_err(|e| StorageSystemError::io(e, "create_temp_file", parent.clone()))?;
        temp_file
            .write_all(text.as_bytes())
            .map_err(|e| StorageSystemError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;
        temp_file
            .persist(path)
            .map_err(|e| StorageSystemError::io(e.error, "persist_temp_file", path.to_path_buf()))?;
        Ok(())
    }

    /// Enables `name`; returns whether it was newly added
    pub fn add_plugin(&mut self, name: &str) -> bool {
        if self.plugins.iter().any(|p| p == name) {
            return false;
        }
        self.plugins.push(name.to_string());
        true
    }

    /// Drops `name` from the enabled plugins; returns whether it was present
    pub fn remove_plugin(&mut self, name: &str) -> bool {
        let before = self.plugins.len();
        self.plugins.retain(|p| p != name);
        before != self.plugins.len()
    }

    /// Removes every name in `names` from the enabled plugins
    pub fn remove_plugins<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> usize {
        names.into_iter().filter(|name| self.remove_plugin(name)).count()
    }

    pub fn host_version(&self) -> HostVersion {
        HostVersion::from(self.host_version)
    }

    /// Host description derived from this configuration.
    ///
    /// An unrecognised platform override falls back to the build platform.
    pub fn environment(&self) -> HostEnvironment {
        let platform = match self.platform.as_deref() {
            None => Platform::current(),
            Some(raw) => raw.parse::<Platform>().unwrap_or_else(|e| {
                log::warn!("{}, using {}", e, Platform::current());
                Platform::current()
            }),
        };
        let mut env = HostEnvironment::current(self.host_version());
        env.platform = platform;
        env
    }

    /// Enabled plugins plus the comma-separated `overrides`, deduplicated
    pub fn requested_plugins(&self, overrides: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let extra = overrides.into_iter().flat_map(|o| o.split(','));
        for name in self.plugins.iter().map(String::as_str).chain(extra) {
            let name = name.trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    pub fn deprecated_plugins(&self) -> Vec<DeprecatedPlugin> {
        deprecation::deprecated_plugins(&self.deprecated)
    }

    pub fn unmaintained_plugins(&self) -> Vec<String> {
        deprecation::unmaintained_plugins(&self.unmaintained)
    }
}

fn format_for(path: &Path) -> Result<ConfigFormat, StorageSystemError> {
    ConfigFormat::from_path(path).ok_or_else(|| {
        StorageSystemError::UnsupportedConfigFormat(path.display().to_string())
    })
}
