/// Application name
pub const APP_NAME: &str = "Tessera";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent sent with every plugin site request
pub const USER_AGENT: &str = concat!("Tessera/", env!("CARGO_PKG_VERSION"));

/// Plugin runtime level provided by this build. Plugins declare the lowest
/// level they accept through `Plugin-Minimum-Java-Version`.
pub const RUNTIME_VERSION: u32 = 17;

/// Default plugins directory
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// File extension of an installed plugin artifact
pub const ARTIFACT_EXTENSION: &str = "tpk";

/// Suffix of an artifact that was downloaded but not installed yet
pub const STAGED_SUFFIX: &str = ".new";

/// Stage of a plugin that does not declare `Plugin-Stage`
pub const DEFAULT_STAGE: i32 = 50;

/// Environment variable with additional plugin names, comma separated
pub const PLUGINS_ENV_VAR: &str = "TESSERA_PLUGINS";

/// Plugin list site used when the configuration names none
pub const DEFAULT_PLUGIN_SITE: &str = "https://plugins.tessera-editor.org/list%<?plugins=>";

/// Days between two time based update proposals
pub const DEFAULT_UPDATE_INTERVAL_DAYS: u32 = 30;

/// Timeout for a single plugin site or artifact request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
