//! Remote catalog documents.
//!
//! A document is a sequence of entries. Each entry starts with a
//! non-indented `name;downloadURL` line followed by tab-indented metadata
//! lines:
//!
//! ```text
//! buildings_tools;https://plugins.example.org/buildings_tools.tpk
//! 	Plugin-Version: 35640
//! 	Plugin-Mainversion: 18000
//! ```
use url::Url;

use crate::kernel::constants::ARTIFACT_EXTENSION;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::metadata::PluginMetadata;

struct PendingEntry {
    name: String,
    download: Option<Url>,
    line: usize,
    block: String,
}

/// Parses a catalog document fetched from `origin`.
///
/// Structural problems fail the whole document. An entry whose metadata
/// cannot be parsed is logged and skipped.
pub fn parse_listing(origin: &str, text: &str) -> Result<Vec<PluginMetadata>, PluginSystemError> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if let Some(attribute) = line.strip_prefix('\t') {
            let Some(entry) = pending.as_mut() else {
                return Err(listing_error(origin, line_no, "metadata line before any plugin entry"));
            };
            entry.block.push_str(attribute);
            entry.block.push('\n');
            continue;
        }
        if let Some(done) = pending.take() {
            finish_entry(origin, done, &mut entries);
        }
        pending = Some(parse_header(origin, line_no, line)?);
    }
    if let Some(done) = pending.take() {
        finish_entry(origin, done, &mut entries);
    }
    Ok(entries)
}

fn listing_error(origin: &str, line: usize, message: impl Into<String>) -> PluginSystemError {
    PluginSystemError::ListingError {
        origin: origin.to_string(),
        line,
        message: message.into(),
    }
}

fn parse_header(origin: &str, line_no: usize, line: &str) -> Result<PendingEntry, PluginSystemError> {
    let (name, url) = line
        .split_once(';')
        .ok_or_else(|| listing_error(origin, line_no, format!("expected 'name;url', found '{}'", line)))?;
    let name = name.trim();
    let name = name
        .strip_suffix(ARTIFACT_EXTENSION)
        .and_then(|n| n.strip_suffix('.'))
        .unwrap_or(name);
    let url = url.trim();
    let download = if url.is_empty() {
        None
    } else {
        Some(Url::parse(url).map_err(|e| listing_error(origin, line_no, format!("invalid download URL '{}': {}", url, e)))?)
    };
    Ok(PendingEntry {
        name: name.to_string(),
        download,
        line: line_no,
        block: String::new(),
    })
}

fn finish_entry(origin: &str, entry: PendingEntry, entries: &mut Vec<PluginMetadata>) {
    match PluginMetadata::parse(&entry.name, &entry.block) {
        Ok(mut metadata) => {
            metadata.download_location = entry.download;
            entries.push(metadata);
        }
        Err(e) => log::warn!("Skipping entry at {}:{}: {}", origin, entry.line, e),
    }
}

/// Serializes entries in the catalog document format
pub fn write_listing<'a>(entries: impl IntoIterator<Item = &'a PluginMetadata>) -> String {
    let mut out = String::new();
    for metadata in entries {
        out.push_str(metadata.name());
        out.push(';');
        if let Some(url) = &metadata.download_location {
            out.push_str(url.as_str());
        }
        out.push('\n');
        for line in metadata.to_block().lines() {
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
