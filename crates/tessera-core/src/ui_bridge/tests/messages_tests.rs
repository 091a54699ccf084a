#![cfg(test)]

use crate::plugin_system::dependency::RejectReason;
use crate::plugin_system::deprecation::DeprecatedPlugin;
use crate::plugin_system::error::{LoadCause, LoadFailure};
use crate::ui_bridge::{ConfirmRequest, HeadlessUi, HostUi, MessageSeverity, Notice};

#[test]
fn test_headless_ui_never_confirms() {
    let ui = HeadlessUi;
    let request = ConfirmRequest::DisableUnmaintained { plugin: "surveyor2".to_string() };
    assert_eq!(ui.confirm(&request), None);
    ui.notify(&Notice::MissingPluginInformation(vec!["ghost".to_string()]));
}

#[test]
fn test_notice_severity() {
    assert_eq!(Notice::DeprecatedRemoved(vec![]).severity(), MessageSeverity::Info);
    assert_eq!(Notice::MissingPluginInformation(vec![]).severity(), MessageSeverity::Warning);
    assert_eq!(Notice::PluginsRejected(vec![]).severity(), MessageSeverity::Warning);
    assert_eq!(Notice::UpdateFailed(vec![]).severity(), MessageSeverity::Error);
}

#[test]
fn test_notice_lists_every_plugin() {
    let notice = Notice::PluginsRejected(vec![
        ("a".to_string(), RejectReason::MissingDependency(vec!["b".to_string()])),
        ("c".to_string(), RejectReason::VersionTooOld { required: 200, current: 100 }),
    ]);
    let text = notice.to_string();
    assert!(text.contains("a: requires plugins that are not loaded: b"));
    assert!(text.contains("c: requires host version 200 (running 100)"));
    assert_eq!(notice.plugins(), vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn test_deprecated_notice_shows_reason() {
    let notice = Notice::DeprecatedRemoved(vec![
        DeprecatedPlugin::new("landsat", Some("replaced by new scanaerial plugin".to_string())),
        DeprecatedPlugin::new("bare", None),
    ]);
    let text = notice.to_string();
    assert!(text.contains("landsat (replaced by new scanaerial plugin)"));
    assert!(text.contains("  bare\n"));
}

#[test]
fn test_load_failed_notice_skips_internal_names() {
    let notice = Notice::LoadFailed(vec![
        LoadFailure::attributed("x", LoadCause::MissingEntryClass),
        LoadFailure::Internal { message: "boom".to_string() },
    ]);
    assert_eq!(notice.plugins(), vec!["x".to_string()]);
    assert!(notice.to_string().contains("Internal loading error: boom"));
}

#[test]
fn test_confirm_request_text() {
    let request = ConfirmRequest::DownloadDespiteVersion {
        plugin: "routing".to_string(),
        requirement: "requires host version 200 (running 100)".to_string(),
    };
    assert_eq!(
        request.to_string(),
        "Plugin 'routing' requires host version 200 (running 100). Download it anyway?"
    );
}
