//! Event payloads published by the overlay worker.

use overlay_core::RuntimeWarningCode;
use serde::Serialize;

/// Outcome of one inbound stats message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatsEvent {
    Applied { seq: Option<u64>, effect_count: usize },
    Stale { seq: u64, watermark: u64 },
    /// Host sent `{}`: stats are no longer live.
    NoData,
    Malformed,
}

/// Which inbound path delivered a settings payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettingsSource {
    Host,
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SettingsEvent {
    Applied { source: SettingsSource, rev: Option<u64> },
    Stale { source: SettingsSource, rev: u64, watermark: u64 },
    Rejected { source: SettingsSource },
    /// A local edit changed the settings.
    Edited { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UiEvent {
    SettingsPanel { open: bool },
    Visibility { visible: bool },
    HudColor { hex: String },
    RuntimeStatus { warning: Option<RuntimeWarningCode> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyncEvent {
    /// A debounced write was queued with this revision.
    Queued { rev: u64 },
    /// Host reported the outcome of persisting a write.
    SyncResult { success: bool, failures: u64 },
    ImportResult { success: bool },
    ExportResult { success: bool },
}
