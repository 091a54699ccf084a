use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;
use tessera_core::plugin_system::artifact::encode_artifact;
use tessera_core::plugin_system::metadata::MetadataBuilder;

fn tessera(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tessera").unwrap();
    cmd.env_remove("TESSERA_PLUGINS").env("RUST_LOG", "warn").arg("--config").arg(config);
    cmd
}

fn install(plugin_dir: &Path, builder: MetadataBuilder) {
    let metadata = builder.build();
    std::fs::create_dir_all(plugin_dir).unwrap();
    let path = plugin_dir.join(format!("{}.tpk", metadata.name()));
    std::fs::write(path, encode_artifact(&metadata, b"payload")).unwrap();
}

fn plugin(name: &str, version: &str) -> MetadataBuilder {
    MetadataBuilder::new(name).unwrap().version(version).entry_class(&format!("{}.Entry", name))
}

#[test]
fn test_help_lists_commands() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tessera")?;
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("cache-name"));
    Ok(())
}

#[test]
fn test_cache_name() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tessera")?;
    cmd.args(["cache-name", "https://example.org:8080/list%<?plugins=>"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::diff("site-example.org-8080-_list.txt\n"));
    Ok(())
}

#[test]
fn test_info_prints_artifact_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    install(temp_dir.path(), plugin("routing", "31").description("Route planner").requires(&["jts"]));

    tessera(&temp_dir.path().join("tessera.json"))
        .arg("info")
        .arg(temp_dir.path().join("routing.tpk"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Plugin-Version: 31"))
        .stdout(predicate::str::contains("Plugin-Requires: jts"));
    Ok(())
}

#[test]
fn test_info_on_missing_file_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    tessera(&temp_dir.path().join("tessera.json"))
        .arg("info")
        .arg(temp_dir.path().join("absent.tpk"))
        .assert()
        .failure();
    Ok(())
}

#[test]
fn test_load_reports_plan_per_pass() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let config = temp_dir.path().join("tessera.json");
    std::fs::write(&config, r#"{"plugins": ["editor", "core", "orphan"], "sites": []}"#)?;
    let plugin_dir = temp_dir.path().join("plugins");
    install(&plugin_dir, plugin("core", "5").early(true));
    install(&plugin_dir, plugin("editor", "2").requires(&["core"]));
    install(&plugin_dir, plugin("orphan", "1").requires(&["nothing"]));

    tessera(&config)
        .arg("load")
        .assert()
        .success()
        .stdout(predicate::str::contains("early pass:\n  load    core (5)"))
        .stdout(predicate::str::contains("late pass:"))
        .stdout(predicate::str::contains("load    editor (2)"))
        .stdout(predicate::str::contains("skip    orphan"));
    Ok(())
}

#[test]
fn test_list_filters_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let config = temp_dir.path().join("tessera.json");
    std::fs::write(&config, r#"{"plugins": [], "sites": []}"#)?;
    let plugin_dir = temp_dir.path().join("plugins");
    install(&plugin_dir, plugin("routing", "31").description("Route planner"));
    install(&plugin_dir, plugin("jts", "4").description("Geometry library"));

    tessera(&config)
        .args(["list", "--filter", "route"])
        .assert()
        .success()
        .stdout(predicate::str::contains("routing"))
        .stdout(predicate::str::contains("installed"))
        .stdout(predicate::str::contains("jts").not());
    Ok(())
}

#[test]
fn test_status_lists_configured_versions() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let config = temp_dir.path().join("tessera.json");
    std::fs::write(&config, r#"{"plugins": ["routing", "unknown"], "sites": []}"#)?;
    install(&temp_dir.path().join("plugins"), plugin("routing", "31"));

    tessera(&config)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::diff("routing (31)\nunknown (unknown)\n"));
    Ok(())
}
