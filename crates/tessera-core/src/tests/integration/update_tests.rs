#![cfg(test)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{EventLog, ScriptedUi, TestHost, artifact, libraries};
use crate::plugin_system::artifact::encode_artifact;
use crate::plugin_system::listing::write_listing;
use crate::plugin_system::metadata::PluginMetadata;
use crate::plugin_system::orchestrator::PluginOrchestrator;
use crate::ui_bridge::Notice;

fn listed(server: &MockServer, metadata: &PluginMetadata) -> PluginMetadata {
    let mut listed = metadata.clone();
    listed.download_location = Some(Url::parse(&format!("{}/download/{}.tpk", server.uri(), metadata.name())).unwrap());
    listed
}

async fn serve_artifact(server: &MockServer, metadata: &PluginMetadata) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}.tpk", metadata.name())))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(encode_artifact(metadata, b"new payload")))
        .mount(server)
        .await;
}

async fn serve_listing(server: &MockServer, entries: &[PluginMetadata]) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(write_listing(entries)))
        .mount(server)
        .await;
}

fn start(host: &TestHost, ui: Arc<ScriptedUi>, events: &EventLog) -> PluginOrchestrator {
    PluginOrchestrator::builder(host.config())
        .config_path(&host.config_path)
        .ui(ui)
        .libraries(Arc::new(libraries(&["routing", "jts", "broken"], events)))
        .plugin_override(None)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_update_then_load_uses_new_artifacts() {
    let server = MockServer::start().await;
    let routing_v2 = artifact("routing", "2").requires(&["jts"]).loadable_at_runtime(true).build();
    let jts = artifact("jts", "5").loadable_at_runtime(true).build();
    serve_listing(&server, &[listed(&server, &routing_v2), listed(&server, &jts)]).await;
    serve_artifact(&server, &routing_v2).await;
    serve_artifact(&server, &jts).await;

    let host = TestHost::new(&["routing"], vec![format!("{}/list", server.uri())]);
    host.install(&artifact("routing", "1").build());
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    let ui = ScriptedUi::new(None);
    let mut orchestrator = start(&host, ui.clone(), &events);

    let update = orchestrator.update_plugins(None, &CancellationToken::new()).await.unwrap();
    assert_eq!(update.updated, vec!["jts", "routing"]);
    assert!(update.failed.is_empty());
    assert!(host.config().updates.last_update.is_some());

    // jts is installed but not enabled, so routing cannot load yet
    let outcome = orchestrator.load_plugins().await.unwrap();
    assert!(outcome.loaded.is_empty());
    assert_eq!(outcome.rejected.len(), 1);

    // both artifacts can be activated without a restart
    let both = vec!["jts".to_string(), "routing".to_string()];
    let enabled = orchestrator.enable_plugins(&both).await.unwrap();
    assert_eq!(enabled.loaded_names(), vec!["jts", "routing"]);
    assert!(enabled.rejected.is_empty());
    assert_eq!(orchestrator.bug_report_information(), "jts (5)\nrouting (2)");
    assert_eq!(host.config().plugins, vec!["routing", "jts"]);
}

#[tokio::test]
async fn test_failed_download_does_not_block_the_batch() {
    let server = MockServer::start().await;
    let routing = artifact("routing", "2").build();
    let broken = artifact("broken", "3").build();
    serve_listing(&server, &[listed(&server, &routing), listed(&server, &broken)]).await;
    serve_artifact(&server, &routing).await;
    Mock::given(method("GET"))
        .and(path("/download/broken.tpk"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let host = TestHost::new(&["routing", "broken"], vec![format!("{}/list", server.uri())]);
    host.install(&artifact("routing", "1").build());
    host.install(&artifact("broken", "1").build());
    let ui = ScriptedUi::new(None);
    let mut orchestrator = start(&host, ui.clone(), &Arc::new(Mutex::new(Vec::new())));

    let update = orchestrator.update_plugins(None, &CancellationToken::new()).await.unwrap();

    assert_eq!(update.updated, vec!["routing"]);
    assert_eq!(update.failed.len(), 1);
    assert_eq!(update.failed[0].0, "broken");
    assert!(matches!(&ui.notices()[..], [Notice::UpdateFailed(failed)] if failed.len() == 1));
    // the old artifact of the failed plugin stays installed
    let installed = std::fs::read(host.plugin_dir.join("broken.tpk")).unwrap();
    assert_eq!(installed, encode_artifact(&artifact("broken", "1").build(), b"payload"));
    assert!(host.config().updates.last_update.is_none());
}

#[tokio::test]
async fn test_cancelled_download_installs_nothing() {
    let server = MockServer::start().await;
    let routing = artifact("routing", "2").build();
    serve_listing(&server, &[listed(&server, &routing)]).await;
    Mock::given(method("GET"))
        .and(path("/download/routing.tpk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(encode_artifact(&routing, b""))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let host = TestHost::new(&["routing"], vec![format!("{}/list", server.uri())]);
    host.install(&artifact("routing", "1").build());
    let ui = ScriptedUi::new(None);
    let mut orchestrator = start(&host, ui.clone(), &Arc::new(Mutex::new(Vec::new())));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });
    let update = orchestrator.update_plugins(None, &cancel).await.unwrap();

    assert!(update.cancelled);
    assert!(update.updated.is_empty());
    assert!(update.failed.is_empty());
    assert!(ui.notices().is_empty());
    assert!(!host.plugin_dir.join("routing.tpk.new").exists());
}
