//! Collapsing a raw effect list into stable-keyed records.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde_json::Value;

use super::TimedEffectRecord;
use super::identity::{EffectSignature, FormIds, LogicalKey, StableIdentity};
use crate::readers::{self, Object};

/// Merges one raw `timedEffects` list.
///
/// Pure function of its input: identity stability across calls comes from the
/// host's ids, not from remembered state. Output keeps first-occurrence order.
pub fn merge_effects(raw: &Value) -> Vec<TimedEffectRecord> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    let mut merged: Vec<ObservedEffect> = Vec::with_capacity(items.len());
    let mut slots: HashMap<LogicalKey, usize> = HashMap::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(observed) = readers::as_object(item).and_then(ObservedEffect::parse) else {
            continue;
        };

        match slots.entry(observed.logical_key(index)) {
            Entry::Occupied(slot) => merged[*slot.get()].absorb(&observed),
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(observed);
            }
        }
    }

    assign_stable_keys(merged)
}

/// Replaces control characters with spaces, collapses whitespace runs and trims.
pub fn sanitize_effect_text(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if (c as u32) < 0x20 || c == '\u{7F}' { ' ' } else { c })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One validated raw entry before stable keys are assigned.
#[derive(Debug)]
struct ObservedEffect {
    instance_id: Option<u64>,
    source_name: String,
    effect_name: String,
    remaining_sec: u32,
    total_sec: u32,
    is_debuff: bool,
    forms: FormIds,
}

impl ObservedEffect {
    fn parse(item: &Object) -> Option<Self> {
        let raw_source = item
            .get("sourceName")
            .and_then(Value::as_str)
            .or_else(|| item.get("name").and_then(Value::as_str))
            .unwrap_or("");
        let raw_effect = item
            .get("effectName")
            .and_then(Value::as_str)
            .unwrap_or(raw_source);

        let mut source_name = sanitize_effect_text(raw_source);
        let mut effect_name = sanitize_effect_text(raw_effect);
        if source_name.is_empty() && effect_name.is_empty() {
            return None;
        }
        if source_name.is_empty() {
            source_name = effect_name.clone();
        } else if effect_name.is_empty() {
            effect_name = source_name.clone();
        }

        let remaining = readers::finite(item.get("remainingSec")).unwrap_or(0.0);
        let total = readers::finite(item.get("totalSec")).unwrap_or(remaining);
        let instance_id = readers::finite(item.get("instanceId"))
            .map(f64::trunc)
            .filter(|id| *id >= 0.0)
            .map(|id| id as u64);

        Some(Self {
            instance_id,
            source_name,
            effect_name,
            remaining_sec: whole_seconds(remaining),
            total_sec: whole_seconds(total),
            is_debuff: item.get("isDebuff").and_then(Value::as_bool) == Some(true),
            forms: FormIds {
                source: read_form_id(item.get("sourceFormId")),
                effect: read_form_id(item.get("effectFormId")),
                spell: read_form_id(item.get("spellFormId")),
            },
        })
    }

    fn logical_key(&self, index: usize) -> LogicalKey {
        match self.instance_id {
            Some(instance_id) => LogicalKey::Instance {
                instance_id,
                forms: self.forms,
                is_debuff: self.is_debuff,
            },
            None => LogicalKey::Volatile {
                source: self.source_name.clone(),
                effect: self.effect_name.clone(),
                total: self.total_sec,
                remaining: self.remaining_sec,
                is_debuff: self.is_debuff,
                forms: self.forms,
                index,
            },
        }
    }

    /// A duplicate copy may carry a stale counter; the larger value wins.
    fn absorb(&mut self, duplicate: &ObservedEffect) {
        self.remaining_sec = self.remaining_sec.max(duplicate.remaining_sec);
        self.total_sec = self.total_sec.max(duplicate.total_sec);
    }

    fn signature(&self) -> EffectSignature {
        EffectSignature {
            source: self.source_name.clone(),
            effect: self.effect_name.clone(),
            total: self.total_sec,
            is_debuff: self.is_debuff,
        }
    }
}

fn assign_stable_keys(merged: Vec<ObservedEffect>) -> Vec<TimedEffectRecord> {
    let mut by_signature: HashMap<EffectSignature, usize> = HashMap::new();
    let mut by_base: HashMap<String, usize> = HashMap::new();

    merged
        .into_iter()
        .map(|effect| {
            let signature = effect.signature();
            let occurrence = bump(&mut by_signature, signature.clone());

            let identity = if effect.instance_id.is_some() || effect.forms.any() {
                StableIdentity::Strong {
                    instance_id: effect.instance_id,
                    forms: effect.forms,
                }
            } else {
                StableIdentity::Volatile {
                    signature,
                    occurrence,
                }
            };

            let base = identity.to_string();
            let stable_key = match bump(&mut by_base, base.clone()) {
                0 => base,
                dup => format!("{base}|dup:{dup}"),
            };

            TimedEffectRecord {
                instance_id: effect.instance_id,
                stable_key,
                source_name: effect.source_name,
                effect_name: effect.effect_name,
                remaining_sec: effect.remaining_sec,
                total_sec: effect.total_sec,
                is_debuff: effect.is_debuff,
                source_form_id: effect.forms.source,
                effect_form_id: effect.forms.effect,
                spell_form_id: effect.forms.spell,
            }
        })
        .collect()
}

/// Returns how many times `key` was seen before and records one more sighting.
fn bump<K: std::hash::Hash + Eq>(counter: &mut HashMap<K, usize>, key: K) -> usize {
    let seen = counter.entry(key).or_insert(0);
    let previous = *seen;
    *seen += 1;
    previous
}

fn whole_seconds(value: f64) -> u32 {
    value.max(0.0).trunc() as u32
}

fn read_form_id(value: Option<&Value>) -> u32 {
    match readers::finite(value).map(f64::trunc) {
        Some(id) if id > 0.0 => id.min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}
