//! Plugins the host refuses to load because they are obsolete or abandoned.
use serde::{Deserialize, Serialize};

const IN_CORE: &str = "integrated into main program";
const NO_LONGER_REQUIRED: &str = "no longer required";

/// A plugin that must no longer be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedPlugin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DeprecatedPlugin {
    pub fn new(name: impl Into<String>, reason: Option<String>) -> Self {
        Self { name: name.into(), reason }
    }

    fn in_core(name: &str) -> Self {
        Self::new(name, Some(IN_CORE.to_string()))
    }

    fn replaced_by(name: &str, replacement: &str) -> Self {
        Self::new(name, Some(format!("replaced by new {} plugin", replacement)))
    }

    fn obsolete(name: &str) -> Self {
        Self::new(name, Some(NO_LONGER_REQUIRED.to_string()))
    }
}

/// Built-in list of deprecated plugins
pub fn builtin_deprecated() -> Vec<DeprecatedPlugin> {
    let mut list: Vec<DeprecatedPlugin> = [
        "mappaint",
        "unglueplugin",
        "ewmsplugin",
        "ywms",
        "geotagged",
        "namefinder",
        "waypoints",
        "slippy_map_chooser",
        "usertools",
        "utilsplugin",
        "ghost",
        "validator",
        "multipoly",
        "remotecontrol",
        "imagery",
        "slippymap",
        "wmsplugin",
        "ParallelWay",
        "ImproveWayAccuracy",
        "restart",
        "wayselector",
        "openstreetbugs",
        "notes",
        "ImageryCache",
        "proj4j",
        "imageryadjust",
    ]
    .into_iter()
    .map(DeprecatedPlugin::in_core)
    .collect();
    list.extend([
        DeprecatedPlugin::replaced_by("landsat", "scanaerial"),
        DeprecatedPlugin::replaced_by("tcx-support", "dataimport"),
        DeprecatedPlugin::replaced_by("dumbutils", "utilsplugin2"),
        DeprecatedPlugin::replaced_by("Curves", "utilsplugin2"),
        DeprecatedPlugin::replaced_by("commons-imaging", "apache-commons"),
        DeprecatedPlugin::replaced_by("OpenStreetView", "OpenStreetCam"),
        DeprecatedPlugin::obsolete("licensechange"),
        DeprecatedPlugin::obsolete("nearclick"),
    ]);
    list
}

/// Built-in list of plugins nobody maintains any more
pub const UNMAINTAINED_PLUGINS: &[&str] = &[
    "irsrectify",
    "surveyor2",
    "gpsbabelgui",
    "Intersect_way",
    "ContourOverlappingMerge",
    "LaneConnector",
    "Remove.redundant.points",
];

/// Built-in list plus configured additions, first occurrence of a name wins
pub fn deprecated_plugins(extra: &[DeprecatedPlugin]) -> Vec<DeprecatedPlugin> {
    let mut list = builtin_deprecated();
    for plugin in extra {
        if !list.iter().any(|p| p.name == plugin.name) {
            list.push(plugin.clone());
        }
    }
    list
}

/// Built-in unmaintained names plus configured additions
pub fn unmaintained_plugins(extra: &[String]) -> Vec<String> {
    let mut list: Vec<String> = UNMAINTAINED_PLUGINS.iter().map(|s| s.to_string()).collect();
    for name in extra {
        if !list.contains(name) {
            list.push(name.clone());
        }
    }
    list
}

/// Names of all plugins that are deprecated or unmaintained
pub fn deprecated_and_unmaintained() -> Vec<String> {
    let mut names: Vec<String> = builtin_deprecated().into_iter().map(|p| p.name).collect();
    names.extend(UNMAINTAINED_PLUGINS.iter().map(|s| s.to_string()));
    names
}
