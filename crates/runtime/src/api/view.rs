//! Immutable render snapshot handed to consumers.

use std::sync::Arc;

use overlay_core::{CombatState, RuntimeDiagnostics, Settings};
use serde::Serialize;

/// Host persistence bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Outcome of the most recent `onSettingsSyncResult`, if any.
    pub last_sync_ok: Option<bool>,
    pub sync_failures: u64,
    pub last_import_ok: Option<bool>,
    pub last_export_ok: Option<bool>,
    /// Revision of the most recently queued outbound write.
    pub last_queued_rev: Option<u64>,
}

impl SyncStatus {
    pub(crate) fn record_sync(&mut self, success: bool) {
        self.last_sync_ok = Some(success);
        if !success {
            self.sync_failures += 1;
        }
    }
}

/// Everything a renderer needs, captured at one point in the command stream.
#[derive(Debug, Clone)]
pub struct OverlayView {
    pub stats: Arc<CombatState>,
    /// False until the first applied snapshot and after an empty or malformed one.
    pub has_live_stats: bool,
    pub settings: Arc<Settings>,
    pub settings_open: bool,
    /// Effective visibility: the session override if set, else `general.visible`.
    pub visible: bool,
    /// The configured accent color, or the HUD color when none is set.
    pub accent_color: String,
    pub hud_color: String,
    pub runtime_diagnostics: Option<RuntimeDiagnostics>,
    pub sync_status: SyncStatus,
}
