#![cfg(test)]

use tempfile::tempdir;

use crate::plugin_system::artifact::{encode_artifact, read_artifact_metadata};
use crate::plugin_system::metadata::MetadataBuilder;
use crate::storage::local::PluginDirectory;

fn artifact_bytes(name: &str, version: &str) -> Vec<u8> {
    let metadata = MetadataBuilder::new(name)
        .unwrap()
        .version(version)
        .min_host_version(100)
        .entry_class("Entry")
        .build();
    encode_artifact(&metadata, b"payload")
}

#[test]
fn test_paths() {
    let dir = PluginDirectory::new("/opt/tessera/plugins");
    assert_eq!(dir.artifact_path("routing"), std::path::PathBuf::from("/opt/tessera/plugins/routing.tpk"));
    assert_eq!(dir.staged_path("routing"), std::path::PathBuf::from("/opt/tessera/plugins/routing.tpk.new"));
}

#[tokio::test]
async fn test_ensure_writable_creates_directory() {
    let temp_dir = tempdir().unwrap();
    let dir = PluginDirectory::new(temp_dir.path().join("a").join("plugins"));
    dir.ensure_writable().await.unwrap();
    assert!(dir.root().is_dir());
}

#[tokio::test]
async fn test_ensure_writable_fails_on_file() {
    let temp_dir = tempdir().unwrap();
    let blocker = temp_dir.path().join("plugins");
    std::fs::write(&blocker, "not a directory").unwrap();
    let dir = PluginDirectory::new(&blocker);
    assert!(dir.ensure_writable().await.is_err());
}

#[tokio::test]
async fn test_listings() {
    let temp_dir = tempdir().unwrap();
    let dir = PluginDirectory::new(temp_dir.path());
    std::fs::write(dir.artifact_path("a"), artifact_bytes("a", "1")).unwrap();
    std::fs::write(dir.staged_path("b"), artifact_bytes("b", "2")).unwrap();
    std::fs::write(dir.cache_path("site-example.org-list.txt"), "").unwrap();
    std::fs::write(dir.cache_path("notes.txt"), "").unwrap();

    assert_eq!(dir.artifacts().await, vec![dir.artifact_path("a")]);
    assert_eq!(dir.staged().await, vec![dir.staged_path("b")]);
    assert_eq!(dir.site_caches().await, vec![dir.cache_path("site-example.org-list.txt")]);
}

#[tokio::test]
async fn test_install_staged_replaces_old_artifact() {
    let temp_dir = tempdir().unwrap();
    let dir = PluginDirectory::new(temp_dir.path());
    std::fs::write(dir.artifact_path("routing"), artifact_bytes("routing", "1")).unwrap();
    std::fs::write(dir.staged_path("routing"), artifact_bytes("routing", "2")).unwrap();
    std::fs::write(dir.staged_path("fresh"), artifact_bytes("fresh", "7")).unwrap();

    let report = dir.install_staged().await;
    assert_eq!(report.installed, vec!["fresh".to_string(), "routing".to_string()]);
    assert!(report.skipped.is_empty());
    assert!(!dir.staged_path("routing").exists());

    let installed = read_artifact_metadata(&dir.artifact_path("routing")).await.unwrap();
    assert_eq!(installed.local_version.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_install_staged_skips_invalid_download() {
    let temp_dir = tempdir().unwrap();
    let dir = PluginDirectory::new(temp_dir.path());
    std::fs::write(dir.artifact_path("broken"), artifact_bytes("broken", "1")).unwrap();
    std::fs::write(dir.staged_path("broken"), b"\n\n\x00\x01garbage").unwrap();

    let report = dir.install_staged().await;
    assert!(report.installed.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "broken");
    assert!(dir.staged_path("broken").exists());
    let kept = read_artifact_metadata(&dir.artifact_path("broken")).await.unwrap();
    assert_eq!(kept.local_version.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_install_staged_without_directory_is_noop() {
    let temp_dir = tempdir().unwrap();
    let dir = PluginDirectory::new(temp_dir.path().join("missing"));
    let report = dir.install_staged().await;
    assert!(report.installed.is_empty());
    assert!(report.skipped.is_empty());
}
