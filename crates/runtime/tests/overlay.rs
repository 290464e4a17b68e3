mod common;

use std::time::Duration;

use common::RecordingHost;
use overlay_core::settings::GroupPosition;
use overlay_runtime::{
    BridgeAddress, BridgeArg, BridgeRegistry, Event, Overlay, OutboundCall, SettingsEvent, SettingsSource, Topic,
};
use serde_json::json;

fn start() -> (Overlay, RecordingHost) {
    let bridge = BridgeRegistry::new();
    let host = RecordingHost::install(&bridge);
    let overlay = Overlay::builder().bridge(bridge).build();
    (overlay, host)
}

fn text(value: serde_json::Value) -> BridgeArg {
    BridgeArg::Text(value.to_string())
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::test(start_paused = true)]
async fn stats_arrive_through_either_address() {
    let (overlay, _host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    assert!(bridge.invoke_path(
        "Bridge.v1.updateStats",
        text(json!({"seq": 1, "playerInfo": {"gold": 500, "experience": 1280.25}})),
    ));
    let view = handle.view().await.unwrap();
    assert!(view.has_live_stats);
    assert_eq!(view.stats.player_info.gold, 500);
    assert_eq!(view.stats.player_info.experience, 1280.25);

    bridge.invoke_path("updateStats", text(json!({"seq": 1, "playerInfo": {"gold": 1}})));
    assert_eq!(handle.view().await.unwrap().stats.player_info.gold, 500);

    bridge.invoke_path("updateStats", BridgeArg::Text("{}".into()));
    let view = handle.view().await.unwrap();
    assert!(!view.has_live_stats);
    assert_eq!(view.stats.player_info.gold, 500);

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_coalesce_into_one_write() {
    let (overlay, host) = start();
    let handle = overlay.handle();

    handle.update_setting("general.opacity", json!(40), true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.update_setting("general.opacity", json!(55), true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.update_setting("general.size", json!("large"), true).await.unwrap();
    assert!(host.settings_writes().is_empty());

    settle().await;
    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["general"]["opacity"], json!(55.0));
    assert_eq!(writes[0]["general"]["size"], json!("large"));
    assert_eq!(writes[0]["schemaVersion"], json!(1));
    assert_eq!(writes[0]["rev"], json!(3));

    let view = handle.view().await.unwrap();
    assert_eq!(view.sync_status.last_queued_rev, Some(3));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unchanged_or_transient_edits_are_not_written() {
    let (overlay, host) = start();
    let handle = overlay.handle();

    let before = handle.view().await.unwrap().settings;
    let after = handle.update_setting("general.opacity", json!(70), true).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&before, &after));

    let edited = handle.update_setting("general.opacity", json!(20), false).await.unwrap();
    assert_eq!(edited.general.opacity, 20.0);

    settle().await;
    assert!(host.settings_writes().is_empty());

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn host_settings_apply_without_echo() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();
    let mut events = handle.subscribe(Topic::Settings);

    bridge.invoke_path(
        "updateSettings",
        text(json!({"rev": 7, "schemaVersion": 1, "general": {"opacity": 35, "accentColor": "#12ab34"}})),
    );
    let view = handle.view().await.unwrap();
    assert_eq!(view.settings.general.opacity, 35.0);
    assert_eq!(view.accent_color, "#12ab34");
    assert!(matches!(
        events.recv().await.unwrap(),
        Event::Settings(SettingsEvent::Applied {
            source: SettingsSource::Host,
            rev: Some(7),
        })
    ));

    bridge.invoke_path("updateSettings", text(json!({"rev": 6, "general": {"opacity": 90}})));
    assert_eq!(handle.view().await.unwrap().settings.general.opacity, 35.0);

    // The next local write must land above the host's revision.
    handle.update_setting("general.opacity", json!(45), true).await.unwrap();
    settle().await;
    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["rev"], json!(8));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn import_reports_result_and_writes_back() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    bridge.invoke_path(
        "importSettingsFromNative",
        text(json!({"rev": 4, "general": {"language": "en"}, "experience": {"enabled": false}})),
    );
    bridge.invoke_path("importSettingsFromNative", BridgeArg::Text("not json".into()));
    let view = handle.view().await.unwrap();

    assert_eq!(
        host.calls_to(OutboundCall::OnImportResult),
        [BridgeArg::Flag(true), BridgeArg::Flag(false)]
    );
    assert_eq!(view.sync_status.last_import_ok, Some(false));
    assert!(!view.settings.experience.enabled);

    settle().await;
    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["rev"], json!(4));
    assert_eq!(writes[0]["general"]["language"], json!("en"));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stale_import_is_accepted_and_rewritten() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    bridge.invoke_path("updateSettings", text(json!({"rev": 10, "general": {"opacity": 60}})));
    bridge.invoke_path("importSettingsFromNative", text(json!({"rev": 2, "general": {"opacity": 15}})));
    let view = handle.view().await.unwrap();

    assert_eq!(host.calls_to(OutboundCall::OnImportResult), [BridgeArg::Flag(true)]);
    assert_eq!(view.settings.general.opacity, 60.0);

    settle().await;
    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["rev"], json!(11));
    assert_eq!(writes[0]["general"]["opacity"], json!(60.0));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn edit_back_after_host_push_is_written() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    handle.update_setting("general.opacity", json!(40), true).await.unwrap();
    settle().await;
    bridge.invoke_path("updateSettings", text(json!({"general": {"opacity": 60}})));
    handle.update_setting("general.opacity", json!(40), true).await.unwrap();
    settle().await;

    let writes = host.settings_writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1]["general"]["opacity"], json!(40.0));
    assert_eq!(writes[1]["rev"], json!(2));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn import_at_current_revision_gets_a_new_one() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    bridge.invoke_path("updateSettings", text(json!({"rev": 5, "general": {"opacity": 60}})));
    bridge.invoke_path("importSettingsFromNative", text(json!({"rev": 5, "general": {"opacity": 30}})));
    let view = handle.view().await.unwrap();
    assert_eq!(view.settings.general.opacity, 30.0);

    settle().await;
    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["rev"], json!(6));
    assert_eq!(writes[0]["general"]["opacity"], json!(30.0));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn host_reports_are_recorded() {
    let (overlay, _host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    bridge.invoke_path("onSettingsSyncResult", BridgeArg::Flag(false));
    bridge.invoke_path("Bridge.v1.onSettingsSyncResult", BridgeArg::Text("false".into()));
    bridge.invoke_path("onExportResult", BridgeArg::Flag(true));
    // Ignored: the report needs a boolean.
    bridge.invoke_path("onExportResult", BridgeArg::Empty);
    bridge.invoke_path(
        "updateRuntimeStatus",
        text(json!({"runtimeVersion": "1.6.1170", "warningCode": "missing-address-library"})),
    );

    let view = handle.view().await.unwrap();
    assert_eq!(view.sync_status.last_sync_ok, Some(false));
    assert_eq!(view.sync_status.sync_failures, 2);
    assert_eq!(view.sync_status.last_export_ok, Some(true));
    let diagnostics = view.runtime_diagnostics.unwrap();
    assert!(diagnostics.has_warning());
    assert_eq!(diagnostics.runtime_version, "1.6.1170");

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn panel_visibility_and_colors() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    bridge.invoke_path("toggleSettings", BridgeArg::Empty);
    bridge.invoke_path("toggleWidgetsVisibility", BridgeArg::Empty);
    bridge.invoke_path("setHUDColor", BridgeArg::Text("#ff8800".into()));
    let view = handle.view().await.unwrap();
    assert!(view.settings_open);
    assert!(!view.visible);
    assert!(view.settings.general.visible);
    assert_eq!(view.hud_color, "#ff8800");
    assert_eq!(view.accent_color, "#ff8800");

    bridge.invoke_path("closeSettings", BridgeArg::Empty);
    assert!(!handle.view().await.unwrap().settings_open);
    assert!(host.calls_to(OutboundCall::OnRequestUnfocus).is_empty());

    handle.close_settings().unwrap();
    handle.view().await.unwrap();
    assert_eq!(
        host.calls_to(OutboundCall::OnRequestUnfocus),
        [BridgeArg::Text(String::new())]
    );

    // Editing the persisted flag drops the session override.
    handle.update_setting("general.visible", json!(true), false).await.unwrap();
    assert!(handle.view().await.unwrap().visible);

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn drag_snaps_and_persists_on_release() {
    let (overlay, host) = start();
    let handle = overlay.handle();

    let shown = handle.drag("time", 1650.0, 508.0).await.unwrap();
    assert_eq!(shown, GroupPosition::new(1660.0, 500.0));
    assert_eq!(handle.resolve_position("time").await.unwrap(), shown);

    assert!(handle.cancel_drag("time").await.unwrap());
    assert_eq!(handle.resolve_position("time").await.unwrap(), GroupPosition::new(20.0, 20.0));

    let placed = handle.drag_end("time", 403.0, 297.0).await.unwrap();
    assert_eq!(placed, GroupPosition::new(400.0, 300.0));
    assert!(!handle.cancel_drag("time").await.unwrap());

    settle().await;
    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["positions"]["time"], json!({"x": 400.0, "y": 300.0}));

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn export_hands_plain_settings_to_host() {
    let (overlay, host) = start();
    let handle = overlay.handle();

    handle.update_setting("timedEffects.maxVisible", json!(9), false).await.unwrap();
    handle.export_settings().await.unwrap();

    let exported = host.calls_to(OutboundCall::OnExportSettings);
    assert_eq!(exported.len(), 1);
    let payload: serde_json::Value = serde_json::from_str(exported[0].as_text().unwrap()).unwrap();
    assert_eq!(payload["timedEffects"]["maxVisible"], json!(9.0));
    assert!(payload.get("rev").is_none());

    overlay.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_retracts_handlers_and_flushes() {
    let (overlay, host) = start();
    let bridge = overlay.bridge().clone();
    let handle = overlay.handle();

    handle.update_setting("general.opacity", json!(25), true).await.unwrap();
    assert!(host.settings_writes().is_empty());

    overlay.shutdown().await.unwrap();

    let writes = host.settings_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["general"]["opacity"], json!(25.0));

    // Only the host's own callbacks remain.
    assert!(!bridge.is_registered(BridgeAddress::Legacy("updateStats")));
    assert!(!bridge.is_registered(BridgeAddress::Namespaced("setHUDColor")));
    assert!(!bridge.invoke_path("Bridge.v1.toggleSettings", BridgeArg::Empty));
    let remaining = bridge.legacy_names();
    assert!(remaining.iter().all(|name| name.parse::<OutboundCall>().is_ok()));
    assert!(handle.view().await.is_err());
}
