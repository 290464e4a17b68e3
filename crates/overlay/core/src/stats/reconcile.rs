//! Inbound stats reconciliation with sequence-based staleness rejection.

use serde_json::Value;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use super::policy::{MergePolicy, StatsGroup};
use super::state::CombatState;
use crate::effects::merge_effects;
use crate::error::{parse_payload, require_object};
use crate::readers::{self, Object};

/// Result of reconciling one stats message.
#[derive(Clone, Debug, PartialEq)]
pub enum StatsOutcome {
    /// The snapshot was merged; the new state is live.
    Applied {
        state: Box<CombatState>,
        seq: Option<u64>,
    },
    /// `seq` did not advance past the last applied one; nothing changed.
    Stale { seq: u64, watermark: u64 },
    /// `{}`: the host's explicit "no data available" signal.
    NoData,
    /// Not JSON, or not a JSON object.
    Malformed,
}

impl StatsOutcome {
    /// New liveness implied by the outcome, or `None` when liveness is untouched.
    pub fn liveness(&self) -> Option<bool> {
        match self {
            StatsOutcome::Applied { .. } => Some(true),
            StatsOutcome::NoData | StatsOutcome::Malformed => Some(false),
            StatsOutcome::Stale { .. } => None,
        }
    }
}

/// Owns the last-applied sequence watermark for the stats channel.
#[derive(Debug, Default)]
pub struct StatsReconciler {
    last_applied_seq: Option<u64>,
}

impl StatsReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied_seq(&self) -> Option<u64> {
        self.last_applied_seq
    }

    /// Parses `json` and reconciles it; a parse failure is [`StatsOutcome::Malformed`].
    pub fn parse_and_reconcile(&mut self, json: &str, previous: &CombatState, now_ms: u64) -> StatsOutcome {
        match parse_payload(json) {
            Ok(raw) => self.reconcile(&raw, previous, now_ms),
            Err(error) => {
                warn!(target: "overlay::stats", %error, "failed to parse stats payload");
                StatsOutcome::Malformed
            }
        }
    }

    /// Reconciles one raw snapshot against `previous`.
    ///
    /// `previous` is never modified; on anything but `Applied` the caller keeps it.
    pub fn reconcile(&mut self, raw: &Value, previous: &CombatState, now_ms: u64) -> StatsOutcome {
        let object = match require_object(raw) {
            Ok(object) => object,
            Err(error) => {
                warn!(target: "overlay::stats", %error, "rejecting stats payload");
                return StatsOutcome::Malformed;
            }
        };
        if object.is_empty() {
            debug!(target: "overlay::stats", "host reported no stats data");
            return StatsOutcome::NoData;
        }

        let seq = readers::read_sequence(object.get("seq"));
        if let (Some(seq), Some(watermark)) = (seq, self.last_applied_seq)
            && seq <= watermark
        {
            debug!(target: "overlay::stats", seq, watermark, "dropping out-of-order stats snapshot");
            return StatsOutcome::Stale { seq, watermark };
        }

        let state = merge_combat_state(object, previous, now_ms);
        if seq.is_some() {
            self.last_applied_seq = seq;
        }

        StatsOutcome::Applied {
            state: Box::new(state),
            seq,
        }
    }
}

/// Merges a raw snapshot object over `previous` following [`StatsGroup::policy`].
pub fn merge_combat_state(raw: &Object, previous: &CombatState, now_ms: u64) -> CombatState {
    let mut next = previous.clone();

    for group in StatsGroup::iter() {
        let slot = raw.get(group.key());
        if slot.is_none() && group.policy() == MergePolicy::Replace {
            continue;
        }
        let group_raw = slot.and_then(readers::as_object);

        match group {
            StatsGroup::Resistances => next.resistances = previous.resistances.patch(group_raw),
            StatsGroup::Defense => next.defense = previous.defense.patch(group_raw),
            StatsGroup::Offense => next.offense = previous.offense.patch(group_raw),
            StatsGroup::Equipped => next.equipped = previous.equipped.patch(group_raw),
            StatsGroup::Movement => next.movement = previous.movement.patch(group_raw),
            StatsGroup::Time => next.time = previous.time.rederive(group_raw, now_ms),
            StatsGroup::PlayerInfo => next.player_info = previous.player_info.patch(group_raw),
            StatsGroup::AlertData => next.alert_data = previous.alert_data.patch(group_raw),
            StatsGroup::TimedEffects => {
                next.timed_effects = merge_effects(slot.unwrap_or(&Value::Null));
                next.effects_observed_at_ms = now_ms;
            }
            StatsGroup::CalcMeta => next.calc_meta = previous.calc_meta.patch(group_raw),
            StatsGroup::IsInCombat => {
                next.is_in_combat = readers::read_bool(slot, previous.is_in_combat)
            }
        }
    }

    next
}
