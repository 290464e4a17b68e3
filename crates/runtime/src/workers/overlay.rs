//! Overlay worker that owns every piece of overlay state.
//!
//! Host calls and local edits arrive as [`Command`]s on one queue and are
//! applied strictly in order, so reconcilers never race each other. Consumers
//! only ever see immutable `Arc` snapshots.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use overlay_core::settings::{self, GroupPosition};
use overlay_core::{
    CombatState, RuntimeDiagnostics, Settings, SettingsOutcome, SettingsReconciler, StatsOutcome,
    StatsReconciler, WidgetPositions,
};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::api::{OverlayError, OverlayView, Result, SyncStatus};
use crate::bridge::HostSink;
use crate::events::{Event, EventBus, SettingsEvent, SettingsSource, StatsEvent, SyncEvent, UiEvent};
use crate::sync::SyncDebouncer;

/// Commands that can be sent to the overlay worker
pub enum Command {
    /// Raw stats JSON from the host.
    UpdateStats(String),
    /// Raw settings JSON pushed by the host; applied without persisting.
    UpdateSettings(String),
    /// Settings JSON the user imported through the host; always written back and answered.
    ImportSettings(String),
    UpdateRuntimeStatus(String),
    ToggleSettings,
    ToggleWidgetsVisibility,
    /// Closes the settings panel. The UI path also asks the host to release focus.
    CloseSettings { request_unfocus: bool },
    SetHudColor(String),
    SettingsSyncResult(bool),
    ExportResult(bool),
    UpdateSetting {
        path: String,
        value: Value,
        persist: bool,
        reply: oneshot::Sender<Arc<Settings>>,
    },
    Drag {
        group: String,
        x: f64,
        y: f64,
        reply: oneshot::Sender<GroupPosition>,
    },
    DragEnd {
        group: String,
        x: f64,
        y: f64,
        reply: oneshot::Sender<GroupPosition>,
    },
    CancelDrag {
        group: String,
        reply: oneshot::Sender<bool>,
    },
    ResolvePosition {
        group: String,
        reply: oneshot::Sender<GroupPosition>,
    },
    ExportSettings { reply: oneshot::Sender<Result<()>> },
    FlushSync { reply: oneshot::Sender<bool> },
    QueryView { reply: oneshot::Sender<OverlayView> },
    /// Flushes pending writes and stops the worker.
    Shutdown,
}

/// Background task that owns the overlay state.
pub struct OverlayWorker {
    stats: Arc<CombatState>,
    has_live_stats: bool,
    stats_reconciler: StatsReconciler,
    settings: Arc<Settings>,
    settings_reconciler: SettingsReconciler,
    settings_open: bool,
    visible_override: Option<bool>,
    hud_color: String,
    diagnostics: Option<RuntimeDiagnostics>,
    sync_status: SyncStatus,
    positions: WidgetPositions,
    debouncer: SyncDebouncer,
    host: Arc<dyn HostSink>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    event_bus: EventBus,
}

/// Initial state and collaborators for [`OverlayWorker::new`].
pub struct WorkerParts {
    pub settings: Settings,
    pub hud_color: String,
    pub positions: WidgetPositions,
    pub debouncer: SyncDebouncer,
    pub host: Arc<dyn HostSink>,
}

impl OverlayWorker {
    pub fn new(parts: WorkerParts, command_rx: mpsc::UnboundedReceiver<Command>, event_bus: EventBus) -> Self {
        info!(target: "overlay::worker", hud_color = %parts.hud_color, "overlay worker initialized");

        Self {
            stats: Arc::new(CombatState::default()),
            has_live_stats: false,
            stats_reconciler: StatsReconciler::new(),
            settings: Arc::new(parts.settings),
            settings_reconciler: SettingsReconciler::new(),
            settings_open: false,
            visible_override: None,
            hud_color: parts.hud_color,
            diagnostics: None,
            sync_status: SyncStatus::default(),
            positions: parts.positions,
            debouncer: parts.debouncer,
            host: parts.host,
            command_rx,
            event_bus,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if matches!(cmd, Command::Shutdown) {
                        break;
                    }
                    self.handle_command(cmd);
                }
                else => break,
            }
        }

        if self.debouncer.flush() {
            info!(target: "overlay::worker", "flushed pending settings write on shutdown");
        }
        debug!(target: "overlay::worker", "overlay worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::UpdateStats(json) => self.apply_stats(&json),
            Command::UpdateSettings(json) => {
                self.apply_settings(&json, SettingsSource::Host);
            }
            Command::ImportSettings(json) => {
                let success = self.apply_settings(&json, SettingsSource::Import);
                self.sync_status.last_import_ok = Some(success);
                self.host.on_import_result(success);
                self.publish(Event::Sync(SyncEvent::ImportResult { success }));
            }
            Command::UpdateRuntimeStatus(json) => self.apply_runtime_status(&json),
            Command::ToggleSettings => {
                self.settings_open = !self.settings_open;
                self.publish(Event::Ui(UiEvent::SettingsPanel {
                    open: self.settings_open,
                }));
            }
            Command::ToggleWidgetsVisibility => {
                self.visible_override = Some(!self.visible());
                self.publish(Event::Ui(UiEvent::Visibility {
                    visible: self.visible(),
                }));
            }
            Command::CloseSettings { request_unfocus } => {
                self.settings_open = false;
                self.publish(Event::Ui(UiEvent::SettingsPanel { open: false }));
                if request_unfocus {
                    self.host.on_request_unfocus(String::new());
                }
            }
            Command::SetHudColor(hex) => {
                self.hud_color = hex.clone();
                self.publish(Event::Ui(UiEvent::HudColor { hex }));
            }
            Command::SettingsSyncResult(success) => {
                self.sync_status.record_sync(success);
                if !success {
                    warn!(
                        target: "overlay::sync",
                        failures = self.sync_status.sync_failures,
                        "host failed to persist settings; keeping local state"
                    );
                }
                self.publish(Event::Sync(SyncEvent::SyncResult {
                    success,
                    failures: self.sync_status.sync_failures,
                }));
            }
            Command::ExportResult(success) => {
                self.sync_status.last_export_ok = Some(success);
                self.publish(Event::Sync(SyncEvent::ExportResult { success }));
            }
            Command::UpdateSetting {
                path,
                value,
                persist,
                reply,
            } => {
                let next = settings::update(&self.settings, &path, value);
                if path == "general.visible" {
                    self.visible_override = None;
                }
                self.adopt_edit(next, path, persist);
                if reply.send(Arc::clone(&self.settings)).is_err() {
                    debug!(target: "overlay::worker", "UpdateSetting reply channel closed (caller dropped)");
                }
            }
            Command::Drag { group, x, y, reply } => {
                let shown = self.positions.on_drag(&group, x, y, &self.settings);
                if reply.send(shown).is_err() {
                    debug!(target: "overlay::worker", "Drag reply channel closed (caller dropped)");
                }
            }
            Command::DragEnd { group, x, y, reply } => {
                let next = self.positions.on_drag_end(&group, x, y, &self.settings);
                self.adopt_edit(next, format!("positions.{group}"), true);
                let resolved = self.positions.resolve(&group, &self.settings);
                if reply.send(resolved).is_err() {
                    debug!(target: "overlay::worker", "DragEnd reply channel closed (caller dropped)");
                }
            }
            Command::CancelDrag { group, reply } => {
                let cancelled = self.positions.cancel_drag(&group);
                if reply.send(cancelled).is_err() {
                    debug!(target: "overlay::worker", "CancelDrag reply channel closed (caller dropped)");
                }
            }
            Command::ResolvePosition { group, reply } => {
                let position = self.positions.resolve(&group, &self.settings);
                if reply.send(position).is_err() {
                    debug!(target: "overlay::worker", "ResolvePosition reply channel closed (caller dropped)");
                }
            }
            Command::ExportSettings { reply } => {
                let result = self.export_settings();
                if reply.send(result).is_err() {
                    debug!(target: "overlay::worker", "ExportSettings reply channel closed (caller dropped)");
                }
            }
            Command::FlushSync { reply } => {
                let flushed = self.debouncer.flush();
                if reply.send(flushed).is_err() {
                    debug!(target: "overlay::worker", "FlushSync reply channel closed (caller dropped)");
                }
            }
            Command::QueryView { reply } => {
                if reply.send(self.view()).is_err() {
                    debug!(target: "overlay::worker", "QueryView reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn apply_stats(&mut self, json: &str) {
        let outcome = self
            .stats_reconciler
            .parse_and_reconcile(json, &self.stats, unix_millis());
        if let Some(live) = outcome.liveness() {
            self.has_live_stats = live;
        }

        let event = match outcome {
            StatsOutcome::Applied { state, seq } => {
                let effect_count = state.timed_effects.len();
                self.stats = Arc::from(state);
                StatsEvent::Applied { seq, effect_count }
            }
            StatsOutcome::Stale { seq, watermark } => StatsEvent::Stale { seq, watermark },
            StatsOutcome::NoData => StatsEvent::NoData,
            StatsOutcome::Malformed => StatsEvent::Malformed,
        };
        self.publish(Event::Stats(event));
    }

    /// Reconciles inbound settings; returns whether the payload was accepted.
    ///
    /// Imports are written back to the host: an applied import keeps its own
    /// revision when that is above every revision seen so far. Otherwise, and
    /// for a stale import, the current settings go out under a fresh revision.
    fn apply_settings(&mut self, json: &str, source: SettingsSource) -> bool {
        let outcome = self
            .settings_reconciler
            .parse_and_reconcile(json, &self.settings);
        let persist = source == SettingsSource::Import;

        let event = match &outcome {
            SettingsOutcome::Applied { settings, rev } => {
                self.settings = Arc::clone(settings);
                self.visible_override = None;
                let fresh_rev = rev.filter(|rev| *rev > self.debouncer.last_revision());
                if let Some(rev) = rev {
                    self.debouncer.observe_revision(*rev);
                }
                if persist {
                    self.persist(fresh_rev);
                }
                SettingsEvent::Applied { source, rev: *rev }
            }
            SettingsOutcome::Stale { rev, watermark, .. } => {
                if persist {
                    self.persist(None);
                }
                SettingsEvent::Stale {
                    source,
                    rev: *rev,
                    watermark: *watermark,
                }
            }
            SettingsOutcome::Rejected => SettingsEvent::Rejected { source },
        };
        self.publish(Event::Settings(event));
        outcome.is_accepted()
    }

    fn apply_runtime_status(&mut self, json: &str) {
        match serde_json::from_str::<Value>(json) {
            Ok(raw) => {
                self.diagnostics = RuntimeDiagnostics::from_raw(&raw);
                if let Some(diagnostics) = &self.diagnostics
                    && diagnostics.has_warning()
                {
                    warn!(
                        target: "overlay::runtime_status",
                        code = <&str>::from(diagnostics.warning_code),
                        runtime = %diagnostics.runtime_version,
                        "host runtime reported a compatibility warning"
                    );
                }
                self.publish(Event::Ui(UiEvent::RuntimeStatus {
                    warning: self.diagnostics.as_ref().map(|d| d.warning_code),
                }));
            }
            Err(error) => {
                warn!(target: "overlay::runtime_status", %error, "failed to parse runtime status");
            }
        }
    }

    /// Installs a locally edited snapshot if it differs from the current one.
    fn adopt_edit(&mut self, next: Arc<Settings>, path: String, persist: bool) {
        if Arc::ptr_eq(&next, &self.settings) {
            debug!(target: "overlay::worker", path = %path, "setting edit changed nothing");
            return;
        }
        self.settings = next;
        self.publish(Event::Settings(SettingsEvent::Edited { path }));
        if persist {
            self.persist(None);
        }
    }

    fn persist(&mut self, explicit_revision: Option<u64>) {
        match self.debouncer.notify(&self.settings, explicit_revision) {
            Ok(Some(rev)) => {
                self.settings_reconciler.note_revision(rev);
                self.sync_status.last_queued_rev = Some(rev);
                self.publish(Event::Sync(SyncEvent::Queued { rev }));
            }
            Ok(None) => {}
            Err(error) => warn!(target: "overlay::sync", %error, "failed to queue settings write"),
        }
    }

    fn export_settings(&self) -> Result<()> {
        let json = serde_json::to_string(self.settings.as_ref()).map_err(OverlayError::Serialize)?;
        self.host.on_export_settings(json);
        Ok(())
    }

    fn visible(&self) -> bool {
        self.visible_override.unwrap_or(self.settings.general.visible)
    }

    fn view(&self) -> OverlayView {
        let accent = &self.settings.general.accent_color;
        OverlayView {
            stats: Arc::clone(&self.stats),
            has_live_stats: self.has_live_stats,
            settings: Arc::clone(&self.settings),
            settings_open: self.settings_open,
            visible: self.visible(),
            accent_color: if accent.is_empty() {
                self.hud_color.clone()
            } else {
                accent.clone()
            },
            hud_color: self.hud_color.clone(),
            runtime_diagnostics: self.diagnostics.clone(),
            sync_status: self.sync_status.clone(),
        }
    }

    fn publish(&self, event: Event) {
        self.event_bus.publish(event);
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
