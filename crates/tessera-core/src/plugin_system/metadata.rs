use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::kernel::constants::DEFAULT_STAGE;
use crate::kernel::environment::{HostVersion, Platform};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::version::{self, PluginVersion, VersionError};

/// Keys recognised in a metadata block
pub mod keys {
    pub const CLASS: &str = "Plugin-Class";
    pub const VERSION: &str = "Plugin-Version";
    pub const MAIN_VERSION: &str = "Plugin-Mainversion";
    pub const MIN_RUNTIME_VERSION: &str = "Plugin-Minimum-Java-Version";
    pub const REQUIRES: &str = "Plugin-Requires";
    pub const PROVIDES: &str = "Plugin-Provides";
    pub const PLATFORM: &str = "Plugin-Platform";
    pub const STAGE: &str = "Plugin-Stage";
    pub const EARLY: &str = "Plugin-Early";
    pub const CAN_LOAD_AT_RUNTIME: &str = "Plugin-Canloadatruntime";
    pub const AUTHOR: &str = "Author";
    pub const DESCRIPTION: &str = "Plugin-Description";
    pub const ICON: &str = "Plugin-Icon";
    pub const LINK: &str = "Plugin-Link";
    pub const CLASS_PATH: &str = "Class-Path";
    /// Suffix of `<host version>_Plugin-Url: <version>;<url>` entries
    pub const VERSIONED_URL_SUFFIX: &str = "_Plugin-Url";
}

/// A field that was parsed but cannot be trusted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidField {
    /// A version field still holds an unresolved build variable
    Placeholder { key: String, value: String },
    /// The plugin lists itself in `Plugin-Requires`
    SelfDependency,
}

/// A recovered problem found while parsing a metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataWarning {
    pub key: String,
    pub message: String,
}

/// Download link for hosts older than the plugin's current `Plugin-Mainversion`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedDownload {
    pub version: String,
    pub url: Url,
}

/// Structured description of one plugin, parsed from its metadata block.
///
/// `version` is what the catalog advertises, `local_version` is what is
/// installed on disk. `name` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMetadata {
    name: String,
    pub version: Option<String>,
    pub local_version: Option<String>,
    pub min_host_version: u32,
    pub min_runtime_version: u32,
    /// Hard dependencies, in declared order, without duplicates
    pub requires: Vec<String>,
    /// Virtual capability name satisfied by this plugin
    pub provides: Option<String>,
    /// Raw platform restriction, kept verbatim so unknown values survive
    pub platform: Option<String>,
    pub stage: i32,
    pub load_early: bool,
    pub loadable_at_runtime: bool,
    /// Entry symbol looked up in the plugin's scope
    pub entry_class: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub link: Option<String>,
    pub download_location: Option<Url>,
    pub artifact_path: Option<PathBuf>,
    /// Declared `Class-Path` entries
    pub class_path: Vec<String>,
    /// Resolved libraries of the loading scope, artifact last
    pub library_paths: Vec<Url>,
    pub versioned_downloads: BTreeMap<u32, VersionedDownload>,
    /// Unrecognised attributes, preserved for serialization
    pub extra: BTreeMap<String, String>,
    invalid_fields: Vec<InvalidField>,
    warnings: Vec<MetadataWarning>,
}

fn validate_name(name: &str) -> Result<String, PluginSystemError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\', ';']) {
        return Err(PluginSystemError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Splits a metadata block into its `Key: Value` attributes.
///
/// A line starting with a single space continues the previous value. The
/// block ends at the first empty line.
fn parse_attributes(
    name: &str,
    block: &str,
    warnings: &mut Vec<MetadataWarning>,
) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    for line in block.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if attributes.is_empty() {
                continue;
            }
            break;
        }
        if let Some(continuation) = line.strip_prefix(' ') {
            match attributes.last_mut() {
                Some((_, value)) => value.push_str(continuation),
                None => warnings.push(MetadataWarning {
                    key: String::new(),
                    message: format!("continuation line without attribute in '{}'", name),
                }),
            }
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                attributes.push((key.trim().to_string(), value.trim().to_string()));
            }
            _ => warnings.push(MetadataWarning {
                key: String::new(),
                message: format!("ignoring malformed line '{}'", line),
            }),
        }
    }
    attributes
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

impl PluginMetadata {
    /// Creates metadata with every field at its default
    pub fn new(name: &str) -> Result<Self, PluginSystemError> {
        Ok(Self {
            name: validate_name(name)?,
            version: None,
            local_version: None,
            min_host_version: 0,
            min_runtime_version: 0,
            requires: Vec::new(),
            provides: None,
            platform: None,
            stage: DEFAULT_STAGE,
            load_early: false,
            loadable_at_runtime: false,
            entry_class: None,
            author: None,
            description: None,
            icon: None,
            link: None,
            download_location: None,
            artifact_path: None,
            class_path: Vec::new(),
            library_paths: Vec::new(),
            versioned_downloads: BTreeMap::new(),
            extra: BTreeMap::new(),
            invalid_fields: Vec::new(),
            warnings: Vec::new(),
        })
    }

    /// Parses a metadata block.
    ///
    /// Fails with a format error when the block holds no attribute at all, or
    /// when `Plugin-Mainversion` or `Plugin-Stage` is present but not a
    /// number. Other problems are recovered and recorded as warnings or
    /// invalid fields.
    pub fn parse(name: &str, block: &str) -> Result<Self, PluginSystemError> {
        let mut metadata = PluginMetadata::new(name)?;
        let mut warnings = Vec::new();
        let attributes = parse_attributes(&metadata.name, block, &mut warnings);
        if attributes.is_empty() {
            return Err(PluginSystemError::format(&metadata.name, "no metadata block found"));
        }
        metadata.warnings = warnings;
        metadata.apply_attributes(attributes)?;
        Ok(metadata)
    }

    /// Parses the metadata block embedded in a local artifact.
    ///
    /// The installed version equals the declared one and the library list is
    /// resolved against the artifact's directory.
    pub fn parse_local(name: &str, block: &str, artifact_path: &Path) -> Result<Self, PluginSystemError> {
        let mut metadata = Self::parse(name, block)?;
        metadata.local_version = metadata.version.clone();
        metadata.set_artifact_path(artifact_path.to_path_buf());
        Ok(metadata)
    }

    fn apply_attributes(&mut self, attributes: Vec<(String, String)>) -> Result<(), PluginSystemError> {
        let mut saw_main_version = false;
        for (key, value) in attributes {
            match key.as_str() {
                keys::CLASS => self.entry_class = non_empty(value),
                keys::VERSION => {
                    if version::is_placeholder(&value) {
                        self.invalid_fields.push(InvalidField::Placeholder { key: key.clone(), value: value.clone() });
                    }
                    self.version = non_empty(value);
                }
                keys::MAIN_VERSION => {
                    saw_main_version = true;
                    match version::parse_numeric_version(&value) {
                        Ok(v) => self.min_host_version = v,
                        Err(VersionError::Placeholder(raw)) => {
                            self.invalid_fields.push(InvalidField::Placeholder { key, value: raw });
                        }
                        Err(VersionError::InvalidFormat(raw)) => {
                            return Err(PluginSystemError::format(
                                &self.name,
                                format!("{} is not a number: '{}'", keys::MAIN_VERSION, raw),
                            ));
                        }
                    }
                }
                keys::MIN_RUNTIME_VERSION => match version::parse_numeric_version(&value) {
                    Ok(v) => self.min_runtime_version = v,
                    Err(VersionError::Placeholder(raw)) => {
                        self.invalid_fields.push(InvalidField::Placeholder { key, value: raw });
                    }
                    Err(VersionError::InvalidFormat(raw)) => self.warnings.push(MetadataWarning {
                        key,
                        message: format!("'{}' is not a number, assuming 0", raw),
                    }),
                },
                keys::REQUIRES => self.set_requires(value.split(';')),
                keys::PROVIDES => self.provides = non_empty(value),
                keys::PLATFORM => self.platform = non_empty(value),
                keys::STAGE => {
                    self.stage = value.trim().parse::<i32>().map_err(|_| {
                        PluginSystemError::format(&self.name, format!("{} is not a number: '{}'", keys::STAGE, value))
                    })?;
                }
                keys::EARLY => self.load_early = parse_bool(&value),
                keys::CAN_LOAD_AT_RUNTIME => self.loadable_at_runtime = parse_bool(&value),
                keys::AUTHOR => self.author = non_empty(value),
                keys::DESCRIPTION => self.description = non_empty(value),
                keys::ICON => self.icon = non_empty(value),
                keys::LINK => self.link = non_empty(value),
                keys::CLASS_PATH => {
                    self.class_path = value.split_whitespace().map(str::to_string).collect();
                }
                _ if key.ends_with(keys::VERSIONED_URL_SUFFIX) => self.add_versioned_download(&key, &value),
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
        if !saw_main_version {
            self.warnings.push(MetadataWarning {
                key: keys::MAIN_VERSION.to_string(),
                message: "missing, assuming 0".to_string(),
            });
        }
        if self.requires.iter().any(|r| r == &self.name) {
            self.invalid_fields.push(InvalidField::SelfDependency);
        }
        Ok(())
    }

    fn add_versioned_download(&mut self, key: &str, value: &str) {
        let prefix = &key[..key.len() - keys::VERSIONED_URL_SUFFIX.len()];
        let parsed = prefix.parse::<u32>().ok().and_then(|host| {
            let (version, url) = value.split_once(';')?;
            let url = Url::parse(url.trim()).ok()?;
            Some((host, VersionedDownload { version: version.trim().to_string(), url }))
        });
        match parsed {
            Some((host, download)) => {
                self.versioned_downloads.insert(host, download);
            }
            None => self.warnings.push(MetadataWarning {
                key: key.to_string(),
                message: format!("ignoring malformed download link '{}'", value),
            }),
        }
    }

    fn set_requires<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.requires.clear();
        for name in names.into_iter().map(str::trim).filter(|n| !n.is_empty()) {
            if !self.requires.iter().any(|r| r == name) {
                self.requires.push(name.to_string());
            }
        }
    }

    /// Writes the metadata block back out.
    ///
    /// Fields derived from the file system (artifact path, library URLs,
    /// installed version) are not part of the block.
    pub fn to_block(&self) -> String {
        fn line(out: &mut String, key: &str, value: &str) {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&value.replace(['\r', '\n'], " "));
            out.push('\n');
        }
        let mut out = String::new();
        if let Some(class) = &self.entry_class {
            line(&mut out, keys::CLASS, class);
        }
        if let Some(version) = &self.version {
            line(&mut out, keys::VERSION, version);
        }
        line(&mut out, keys::MAIN_VERSION, &self.min_host_version.to_string());
        if self.min_runtime_version > 0 {
            line(&mut out, keys::MIN_RUNTIME_VERSION, &self.min_runtime_version.to_string());
        }
        if !self.requires.is_empty() {
            line(&mut out, keys::REQUIRES, &self.requires.join(";"));
        }
        if let Some(provides) = &self.provides {
            line(&mut out, keys::PROVIDES, provides);
        }
        if let Some(platform) = &self.platform {
            line(&mut out, keys::PLATFORM, platform);
        }
        line(&mut out, keys::STAGE, &self.stage.to_string());
        if self.load_early {
            line(&mut out, keys::EARLY, "true");
        }
        if self.loadable_at_runtime {
            line(&mut out, keys::CAN_LOAD_AT_RUNTIME, "true");
        }
        if let Some(author) = &self.author {
            line(&mut out, keys::AUTHOR, author);
        }
        if let Some(description) = &self.description {
            line(&mut out, keys::DESCRIPTION, description);
        }
        if let Some(icon) = &self.icon {
            line(&mut out, keys::ICON, icon);
        }
        if let Some(link) = &self.link {
            line(&mut out, keys::LINK, link);
        }
        if !self.class_path.is_empty() {
            line(&mut out, keys::CLASS_PATH, &self.class_path.join(" "));
        }
        for (host, download) in &self.versioned_downloads {
            line(
                &mut out,
                &format!("{}{}", host, keys::VERSIONED_URL_SUFFIX),
                &format!("{};{}", download.version, download.url),
            );
        }
        for (key, value) in &self.extra {
            line(&mut out, key, value);
        }
        out
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invalid_fields(&self) -> &[InvalidField] {
        &self.invalid_fields
    }

    pub fn warnings(&self) -> &[MetadataWarning] {
        &self.warnings
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_fields.is_empty()
    }

    /// Whether this plugin satisfies a `Plugin-Requires` entry
    pub fn satisfies(&self, requirement: &str) -> bool {
        self.name == requirement || self.provides.as_deref() == Some(requirement)
    }

    /// Records where the artifact lives and rebuilds the library list.
    ///
    /// Relative `Class-Path` entries resolve against the artifact's directory.
    /// The artifact itself is appended unless it is already the first entry.
    pub fn set_artifact_path(&mut self, path: PathBuf) {
        let absolute = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
        let base = absolute.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut libraries = Vec::new();
        for entry in &self.class_path {
            let entry_path = Path::new(entry);
            let resolved = if entry_path.is_absolute() { entry_path.to_path_buf() } else { base.join(entry_path) };
            match Url::from_file_path(&resolved) {
                Ok(url) => libraries.push(url),
                Err(()) => log::warn!("Plugin '{}': ignoring library entry '{}'", self.name, entry),
            }
        }
        match Url::from_file_path(&absolute) {
            Ok(own) => {
                if libraries.first() != Some(&own) {
                    libraries.push(own);
                }
            }
            Err(()) => log::warn!("Plugin '{}': cannot express '{}' as a URL", self.name, absolute.display()),
        }
        self.library_paths = libraries;
        self.artifact_path = Some(path);
    }

    fn has_local_info(&self) -> bool {
        self.artifact_path.is_some() || self.local_version.is_some()
    }

    /// Authoritative-wins merge of `other` into `self`.
    ///
    /// Presentation and compatibility fields are taken from `other`. The
    /// artifact path, installed version and library list only change when
    /// `other` itself carries local information.
    pub fn merge_from(&mut self, other: &PluginMetadata) {
        self.version = other.version.clone();
        self.min_host_version = other.min_host_version;
        self.min_runtime_version = other.min_runtime_version;
        self.requires = other.requires.clone();
        self.provides = other.provides.clone();
        self.platform = other.platform.clone();
        self.stage = other.stage;
        self.load_early = other.load_early;
        self.loadable_at_runtime = other.loadable_at_runtime;
        self.entry_class = other.entry_class.clone();
        self.author = other.author.clone();
        self.description = other.description.clone();
        self.icon = other.icon.clone();
        self.link = other.link.clone();
        if other.download_location.is_some() {
            self.download_location = other.download_location.clone();
        }
        self.class_path = other.class_path.clone();
        self.versioned_downloads = other.versioned_downloads.clone();
        self.extra = other.extra.clone();
        self.invalid_fields = other.invalid_fields.clone();
        self.warnings = other.warnings.clone();
        if other.has_local_info() {
            self.local_version = other.local_version.clone();
            self.artifact_path = other.artifact_path.clone();
            self.library_paths = other.library_paths.clone();
        }
    }

    /// Copies the forward-looking fields a plugin site advertises.
    ///
    /// Compatibility fields describe the installed artifact and are left
    /// untouched, as is everything local.
    pub fn update_from_site(&mut self, remote: &PluginMetadata) {
        self.version = remote.version.clone();
        self.author = remote.author.clone();
        self.description = remote.description.clone();
        self.icon = remote.icon.clone();
        self.link = remote.link.clone();
        if remote.download_location.is_some() {
            self.download_location = remote.download_location.clone();
        }
        self.versioned_downloads = remote.versioned_downloads.clone();
    }

    /// Refreshes everything from a freshly installed artifact
    pub fn update_from_local(&mut self, installed: &PluginMetadata) {
        log::debug!(
            "Refreshing '{}' from installed version {}",
            self.name,
            installed.local_version.as_deref().unwrap_or("?")
        );
        self.merge_from(installed);
    }

    /// True if the plugin may run on `current`.
    ///
    /// An unrecognised platform identifier is accepted with a warning.
    pub fn is_applicable_to_platform(&self, current: Platform) -> bool {
        match self.platform.as_deref() {
            None => true,
            Some(raw) => match raw.parse::<Platform>() {
                Ok(required) => required == current,
                Err(e) => {
                    log::warn!("Plugin '{}': {}, assuming it is applicable", self.name, e);
                    true
                }
            },
        }
    }

    /// Switches to the best download link for an older host.
    ///
    /// Applies when the plugin needs a newer host than `host` and a
    /// `<N>_Plugin-Url` entry with `N <= host` exists; the largest such `N`
    /// wins. Returns whether the download was replaced.
    pub fn select_download_for_host(&mut self, host: HostVersion) -> bool {
        let Some(current) = host.known() else {
            return false;
        };
        if self.min_host_version <= current {
            return false;
        }
        let Some((required, download)) = self.versioned_downloads.range(..=current).next_back() else {
            return false;
        };
        log::debug!(
            "Plugin '{}': using version {} for host {} instead of {:?}",
            self.name,
            download.version,
            current,
            self.version
        );
        self.min_host_version = *required;
        self.version = Some(download.version.clone());
        self.download_location = Some(download.url.clone());
        true
    }

    /// Whether the advertised version should replace the installed one
    pub fn is_update_required(&self) -> bool {
        if self.download_location.is_none() {
            return false;
        }
        match (&self.local_version, &self.version) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(local), Some(advertised)) => local != advertised,
        }
    }

    /// True when both versions are known and the installed one is older
    pub fn has_newer_advertised(&self) -> bool {
        match (&self.local_version, &self.version) {
            (Some(local), Some(advertised)) => {
                PluginVersion::new(local.as_str()).is_older_than(&PluginVersion::new(advertised.as_str()))
            }
            _ => false,
        }
    }

    /// Word search over name, description and both versions.
    ///
    /// Every whitespace-separated word of `filter` must occur in at least one
    /// of them, ignoring case.
    pub fn matches(&self, filter: &str) -> bool {
        let haystacks: Vec<String> = [
            Some(self.name.as_str()),
            self.description.as_deref(),
            self.version.as_deref(),
            self.local_version.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();
        filter
            .split_whitespace()
            .map(str::to_lowercase)
            .all(|word| haystacks.iter().any(|h| h.contains(&word)))
    }
}

/// Builder for creating plugin metadata in code
pub struct MetadataBuilder {
    metadata: PluginMetadata,
}

impl MetadataBuilder {
    pub fn new(name: &str) -> Result<Self, PluginSystemError> {
        Ok(Self { metadata: PluginMetadata::new(name)? })
    }

    pub fn version(mut self, version: &str) -> Self {
        self.metadata.version = Some(version.to_string());
        self
    }

    pub fn local_version(mut self, version: &str) -> Self {
        self.metadata.local_version = Some(version.to_string());
        self
    }

    pub fn min_host_version(mut self, version: u32) -> Self {
        self.metadata.min_host_version = version;
        self
    }

    pub fn min_runtime_version(mut self, version: u32) -> Self {
        self.metadata.min_runtime_version = version;
        self
    }

    pub fn requires(mut self, names: &[&str]) -> Self {
        self.metadata.set_requires(names.iter().copied());
        if self.metadata.requires.iter().any(|r| r == &self.metadata.name) {
            self.metadata.invalid_fields.push(InvalidField::SelfDependency);
        }
        self
    }

    pub fn provides(mut self, capability: &str) -> Self {
        self.metadata.provides = Some(capability.to_string());
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.metadata.platform = Some(platform.to_string());
        self
    }

    pub fn stage(mut self, stage: i32) -> Self {
        self.metadata.stage = stage;
        self
    }

    pub fn early(mut self, early: bool) -> Self {
        self.metadata.load_early = early;
        self
    }

    pub fn loadable_at_runtime(mut self, loadable: bool) -> Self {
        self.metadata.loadable_at_runtime = loadable;
        self
    }

    pub fn entry_class(mut self, class: &str) -> Self {
        self.metadata.entry_class = Some(class.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.metadata.description = Some(description.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.metadata.author = Some(author.to_string());
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.metadata.icon = Some(icon.to_string());
        self
    }

    pub fn link(mut self, link: &str) -> Self {
        self.metadata.link = Some(link.to_string());
        self
    }

    /// Download link used by hosts at `host_version` or newer
    pub fn versioned_download(mut self, host_version: u32, version: &str, url: Url) -> Self {
        self.metadata
            .versioned_downloads
            .insert(host_version, VersionedDownload { version: version.to_string(), url });
        self
    }

    /// Attribute with no dedicated field
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.metadata.extra.insert(key.to_string(), value.to_string());
        self
    }

    pub fn download_location(mut self, url: Url) -> Self {
        self.metadata.download_location = Some(url);
        self
    }

    pub fn class_path(mut self, entries: &[&str]) -> Self {
        self.metadata.class_path = entries.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata.set_artifact_path(path.into());
        self
    }

    pub fn build(self) -> PluginMetadata {
        self.metadata
    }
}
