//! Overlay settings: validated model, revision-aware reconciler and path updates.

mod model;
mod reconcile;
mod update;

pub use model::{
    DefenseFlags, EquippedFlags, ExperienceFlags, GeneralSettings, GroupPosition, Language, MovementFlags,
    OffenseFlags, PlayerInfoFlags, ResistanceFlags, Settings, TimeFlags, TimedEffectsSettings, VisualAlerts,
    WidgetLayout, WidgetSize,
};
pub use reconcile::{SCHEMA_VERSION, SettingsOutcome, SettingsReconciler};
pub use update::update;
