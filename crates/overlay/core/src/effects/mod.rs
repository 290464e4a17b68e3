//! Timed effect (buff/debuff) records and the list merger.

mod identity;
mod merge;

use serde::Serialize;

pub use identity::{EffectSignature, FormIds, LogicalKey, StableIdentity};
pub use merge::{merge_effects, sanitize_effect_text};

/// One active buff or debuff as shown by the overlay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEffectRecord {
    /// Host-assigned instance id; `None` when absent or negative.
    pub instance_id: Option<u64>,
    /// Locally derived key, unique within one snapshot and stable across snapshots.
    pub stable_key: String,
    pub source_name: String,
    pub effect_name: String,
    pub remaining_sec: u32,
    pub total_sec: u32,
    pub is_debuff: bool,
    pub source_form_id: u32,
    pub effect_form_id: u32,
    pub spell_form_id: u32,
}

impl TimedEffectRecord {
    /// Label shown by the renderer: `source (effect)` unless both names agree.
    pub fn display_name(&self) -> String {
        if self.effect_name.is_empty() || self.effect_name == self.source_name {
            self.source_name.clone()
        } else {
            format!("{} ({})", self.source_name, self.effect_name)
        }
    }
}
