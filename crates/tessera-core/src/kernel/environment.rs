use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::kernel::constants::RUNTIME_VERSION;

/// Operating system family a plugin can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Windows,
    Osx,
    Unixoid,
}

impl Platform {
    /// The platform this binary was built for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Unixoid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "WINDOWS",
            Platform::Osx => "OSX",
            Platform::Unixoid => "UNIXOID",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a platform identifier is not one of `WINDOWS`, `OSX`, `UNIXOID`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform identifier: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WINDOWS" => Ok(Platform::Windows),
            "OSX" => Ok(Platform::Osx),
            "UNIXOID" => Ok(Platform::Unixoid),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// Version of the running host application.
///
/// Development builds do not know their version; an unknown host accepts
/// every plugin regardless of its `Plugin-Mainversion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostVersion {
    Known(u32),
    Unknown,
}

impl HostVersion {
    /// Whether a plugin requiring `required` may run on this host
    pub fn satisfies(&self, required: u32) -> bool {
        match self {
            HostVersion::Known(current) => required <= *current,
            HostVersion::Unknown => true,
        }
    }

    pub fn known(&self) -> Option<u32> {
        match self {
            HostVersion::Known(v) => Some(*v),
            HostVersion::Unknown => None,
        }
    }
}

impl From<Option<u32>> for HostVersion {
    fn from(value: Option<u32>) -> Self {
        value.map_or(HostVersion::Unknown, HostVersion::Known)
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostVersion::Known(v) => write!(f, "{}", v),
            HostVersion::Unknown => f.write_str("unknown"),
        }
    }
}

/// Everything the plugin core needs to know about the running host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    pub host_version: HostVersion,
    pub runtime_version: u32,
    pub platform: Platform,
}

impl HostEnvironment {
    pub fn new(host_version: HostVersion, runtime_version: u32, platform: Platform) -> Self {
        Self { host_version, runtime_version, platform }
    }

    /// Environment of this process for the given host version
    pub fn current(host_version: HostVersion) -> Self {
        Self::new(host_version, RUNTIME_VERSION, Platform::current())
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::current(HostVersion::Unknown)
    }
}
