//! Reading and writing `.tpk` plugin artifacts.
//!
//! An artifact starts with a metadata block terminated by an empty line;
//! everything after it is an opaque payload owned by the plugin.
use std::path::Path;

use crate::kernel::constants::{ARTIFACT_EXTENSION, STAGED_SUFFIX};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::metadata::PluginMetadata;

/// Plugin name of an installed (`foo.tpk`) or staged (`foo.tpk.new`) artifact
pub fn artifact_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let file_name = file_name.strip_suffix(STAGED_SUFFIX).unwrap_or(file_name);
    let stem = file_name.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() { None } else { Some(stem.to_string()) }
}

/// Splits raw artifact bytes into the metadata header and the payload
pub fn split_artifact(content: &[u8]) -> (&[u8], &[u8]) {
    let mut start = 0;
    while let Some(offset) = content[start..].iter().position(|b| *b == b'\n') {
        let line_end = start + offset;
        let line = &content[start..line_end];
        if line.is_empty() || line == b"\r" {
            return (&content[..start], &content[line_end + 1..]);
        }
        start = line_end + 1;
    }
    (content, &[])
}

/// Parses the metadata header of an artifact already in memory
pub fn parse_artifact(name: &str, content: &[u8], path: &Path) -> Result<PluginMetadata, PluginSystemError> {
    let (header, _) = split_artifact(content);
    let header = std::str::from_utf8(header)
        .map_err(|_| PluginSystemError::format(name, "metadata block is not valid UTF-8"))?;
    PluginMetadata::parse_local(name, header, path)
}

/// Reads the metadata of the artifact at `path`.
///
/// The plugin name is taken from the file name.
pub async fn read_artifact_metadata(path: &Path) -> Result<PluginMetadata, PluginSystemError> {
    let name = artifact_name(path).ok_or_else(|| {
        PluginSystemError::InvalidName(path.display().to_string())
    })?;
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| PluginSystemError::artifact_io(e, "read_artifact", path.to_path_buf()))?;
    parse_artifact(&name, &content, path)
}

/// Builds artifact bytes from metadata and a payload
pub fn encode_artifact(metadata: &PluginMetadata, payload: &[u8]) -> Vec<u8> {
    let mut out = metadata.to_block().into_bytes();
    out.push(b'\n');
    out.extend_from_slice(payload);
    out
}
