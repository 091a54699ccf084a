use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;

/// Marker that starts an unresolved build variable, e.g. `${plugin.version}`
pub const PLACEHOLDER_MARKER: &str = "${";

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),
    #[error("Unresolved version placeholder: {0}")]
    Placeholder(String),
}

/// Whether a declared version is an unresolved template variable
pub fn is_placeholder(value: &str) -> bool {
    value.trim_start().starts_with(PLACEHOLDER_MARKER)
}

/// Parses an integer version field such as `Plugin-Mainversion`.
pub fn parse_numeric_version(value: &str) -> Result<u32, VersionError> {
    let trimmed = value.trim();
    if is_placeholder(trimmed) {
        return Err(VersionError::Placeholder(trimmed.to_string()));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| VersionError::InvalidFormat(trimmed.to_string()))
}

/// A plugin version as published by a plugin author.
///
/// Plugin versions are free-form strings. Most are either a plain build number
/// (`35640`) or a dotted release (`1.4`, `2.0.1-beta`). Two versions of the
/// same shape can be ordered; anything else is only comparable for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginVersion {
    raw: String,
}

impl PluginVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into().trim().to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_placeholder(&self) -> bool {
        is_placeholder(&self.raw)
    }

    fn as_build_number(&self) -> Option<u64> {
        self.raw.parse::<u64>().ok()
    }

    /// Lenient semver: `1.4` is read as `1.4.0`.
    fn as_semver(&self) -> Option<Version> {
        if let Ok(v) = Version::parse(&self.raw) {
            return Some(v);
        }
        let core_len = self.raw.find(['-', '+']).unwrap_or(self.raw.len());
        let (core, rest) = self.raw.split_at(core_len);
        let parts = core.split('.').count();
        let padded = match parts {
            1 => format!("{}.0.0{}", core, rest),
            2 => format!("{}.0{}", core, rest),
            _ => return None,
        };
        Version::parse(&padded).ok()
    }

    /// Orders two versions of the same shape; `None` when they cannot be compared.
    pub fn compare(&self, other: &PluginVersion) -> Option<Ordering> {
        if self.raw == other.raw {
            return Some(Ordering::Equal);
        }
        if let (Some(a), Some(b)) = (self.as_build_number(), other.as_build_number()) {
            return Some(a.cmp(&b));
        }
        match (self.as_semver(), other.as_semver()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }

    /// True when `self` is known to be older than `other`
    pub fn is_older_than(&self, other: &PluginVersion) -> bool {
        self.compare(other) == Some(Ordering::Less)
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PluginVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(VersionError::InvalidFormat(s.to_string()));
        }
        Ok(PluginVersion::new(s))
    }
}
