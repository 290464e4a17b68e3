//! Pure reconciliation logic for the overlay.
//!
//! Turns untrusted host JSON into validated, schema-complete state:
//! [`stats`] and [`settings`] reconcilers with ordering protection, the
//! [`effects`] merger that keeps timed effects identity-stable, and the
//! [`positions`] resolver for draggable widget groups. Nothing here performs
//! I/O or reads a clock; the `overlay-runtime` crate drives it.
pub mod diagnostics;
pub mod effects;
pub mod error;
pub mod positions;
pub mod readers;
pub mod settings;
pub mod stats;

pub use diagnostics::{RuntimeDiagnostics, RuntimeWarningCode};
pub use effects::{TimedEffectRecord, merge_effects};
pub use error::ReconcileError;
pub use positions::{SnapConfig, SnapTieBreak, WidgetGroupId, WidgetPositions};
pub use settings::{SCHEMA_VERSION, Settings, SettingsOutcome, SettingsReconciler};
pub use stats::{CombatState, StatsOutcome, StatsReconciler};
