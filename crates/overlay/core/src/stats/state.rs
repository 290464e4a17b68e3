//! The render-ready combat snapshot and its per-group field-wise merges.
//!
//! Every group exposes a `patch` that reads each leaf from the raw group
//! object with the current value as fallback. A missing or non-object group
//! therefore yields an exact copy of the previous group.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::effects::TimedEffectRecord;
use crate::readers::{self, Object, child_object, field};

const RESIST: RangeInclusive<f64> = -1000.0..=1000.0;
const PERCENT: RangeInclusive<f64> = -1000.0..=1000.0;
const DAMAGE: RangeInclusive<f64> = -100000.0..=100000.0;
const VITAL: RangeInclusive<f64> = 0.0..=100000.0;
const XP: RangeInclusive<f64> = 0.0..=999999999.0;
const ALERT_PCT: RangeInclusive<f64> = 0.0..=1000.0;
const CAP: RangeInclusive<f64> = 0.0..=1000.0;

/// Month names indexed by the host's zero-based month.
pub const MONTH_NAMES: [&str; 12] = [
    "Morning Star",
    "Sun's Dawn",
    "First Seed",
    "Rain's Hand",
    "Second Seed",
    "Midyear",
    "Sun's Height",
    "Last Seed",
    "Hearthfire",
    "Frostfall",
    "Sun's Dusk",
    "Evening Star",
];

/// Fully validated player/combat numbers. Every field is always populated.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatState {
    pub resistances: Resistances,
    pub defense: Defense,
    pub offense: Offense,
    pub equipped: Equipped,
    pub movement: Movement,
    pub time: GameTime,
    pub player_info: PlayerInfo,
    pub alert_data: AlertData,
    pub timed_effects: Vec<TimedEffectRecord>,
    /// Local clock reading when `timed_effects` was last replaced.
    pub effects_observed_at_ms: u64,
    pub calc_meta: CalculationMeta,
    pub is_in_combat: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Resistances {
    pub magic: f64,
    pub fire: f64,
    pub frost: f64,
    pub shock: f64,
    pub poison: f64,
    pub disease: f64,
}

impl Resistances {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            magic: readers::read_number(field(raw, "magic"), self.magic, RESIST),
            fire: readers::read_number(field(raw, "fire"), self.fire, RESIST),
            frost: readers::read_number(field(raw, "frost"), self.frost, RESIST),
            shock: readers::read_number(field(raw, "shock"), self.shock, RESIST),
            poison: readers::read_number(field(raw, "poison"), self.poison, RESIST),
            disease: readers::read_number(field(raw, "disease"), self.disease, RESIST),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Defense {
    pub armor_rating: f64,
    pub damage_reduction: f64,
}

impl Defense {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            armor_rating: readers::read_number(field(raw, "armorRating"), self.armor_rating, DAMAGE),
            damage_reduction: readers::read_number(
                field(raw, "damageReduction"),
                self.damage_reduction,
                PERCENT,
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offense {
    pub right_hand_damage: f64,
    pub left_hand_damage: f64,
    pub crit_chance: f64,
}

impl Offense {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            right_hand_damage: readers::read_number(
                field(raw, "rightHandDamage"),
                self.right_hand_damage,
                DAMAGE,
            ),
            left_hand_damage: readers::read_number(
                field(raw, "leftHandDamage"),
                self.left_hand_damage,
                DAMAGE,
            ),
            crit_chance: readers::read_number(field(raw, "critChance"), self.crit_chance, PERCENT),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipped {
    pub right_hand: String,
    pub left_hand: String,
}

impl Equipped {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            right_hand: readers::read_text(field(raw, "rightHand"), &self.right_hand, true),
            left_hand: readers::read_text(field(raw, "leftHand"), &self.left_hand, true),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub speed_mult: f64,
}

impl Default for Movement {
    fn default() -> Self {
        Self { speed_mult: 100.0 }
    }
}

impl Movement {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            speed_mult: readers::read_number(field(raw, "speedMult"), self.speed_mult, 0.0..=10000.0),
        }
    }
}

/// In-game calendar time plus the local instant the snapshot arrived.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTime {
    pub year: u32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub month_name: String,
    pub time_scale: f64,
    pub snapshot_at_ms: u64,
}

impl Default for GameTime {
    fn default() -> Self {
        Self {
            year: 201,
            month: 0,
            day: 1,
            hour: 12,
            minute: 0,
            month_name: MONTH_NAMES[0].to_owned(),
            time_scale: 20.0,
            snapshot_at_ms: 0,
        }
    }
}

impl GameTime {
    /// Rebuilds the time group from a present `time` slot.
    ///
    /// The slot is replace-not-patch: it always gets a fresh `snapshot_at_ms`,
    /// even when the raw value is not an object, because elapsed-time
    /// extrapolation is measured from that instant.
    pub(crate) fn rederive(&self, raw: Option<&Object>, now_ms: u64) -> Self {
        let month = readers::read_whole(field(raw, "month"), f64::from(self.month), 0.0..=11.0) as u8;
        let month_name = match raw {
            Some(_) => readers::read_text(field(raw, "monthName"), month_name_for(month), false),
            None if self.month_name.is_empty() => month_name_for(month).to_owned(),
            None => self.month_name.clone(),
        };

        Self {
            year: readers::read_whole(field(raw, "year"), f64::from(self.year), 1.0..=9999.0) as u32,
            month,
            day: readers::read_whole(field(raw, "day"), f64::from(self.day), 1.0..=31.0) as u8,
            hour: readers::read_whole(field(raw, "hour"), f64::from(self.hour), 0.0..=23.0) as u8,
            minute: readers::read_whole(field(raw, "minute"), f64::from(self.minute), 0.0..=59.0) as u8,
            month_name,
            time_scale: readers::read_number(field(raw, "timeScale"), self.time_scale, 0.0..=2000.0),
            snapshot_at_ms: now_ms,
        }
    }
}

fn month_name_for(month: u8) -> &'static str {
    MONTH_NAMES
        .get(usize::from(month))
        .copied()
        .unwrap_or(MONTH_NAMES[0])
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub level: u32,
    pub experience: f64,
    pub exp_to_next_level: f64,
    pub next_level_total_xp: f64,
    pub gold: u64,
    pub carry_weight: f64,
    pub max_carry_weight: f64,
    pub health: f64,
    pub magicka: f64,
    pub stamina: f64,
}

impl Default for PlayerInfo {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0.0,
            exp_to_next_level: 0.0,
            next_level_total_xp: 0.0,
            gold: 0,
            carry_weight: 0.0,
            max_carry_weight: 300.0,
            health: 100.0,
            magicka: 100.0,
            stamina: 100.0,
        }
    }
}

impl PlayerInfo {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        let experience =
            readers::quantize2(readers::read_number(field(raw, "experience"), self.experience, XP));
        let exp_to_next_level = readers::quantize2(readers::read_number(
            field(raw, "expToNextLevel"),
            self.exp_to_next_level,
            XP,
        ));
        let supplied_total = readers::quantize2(readers::read_number(
            field(raw, "nextLevelTotalXp"),
            self.next_level_total_xp,
            XP,
        ));
        // An inconsistent host payload can under-report the level total.
        let next_level_total_xp =
            readers::quantize2((experience + exp_to_next_level).max(supplied_total));

        Self {
            level: readers::read_whole(field(raw, "level"), f64::from(self.level), 1.0..=9999.0) as u32,
            experience,
            exp_to_next_level,
            next_level_total_xp,
            gold: readers::read_whole(field(raw, "gold"), self.gold as f64, XP) as u64,
            carry_weight: readers::read_number(field(raw, "carryWeight"), self.carry_weight, DAMAGE),
            max_carry_weight: readers::read_number(
                field(raw, "maxCarryWeight"),
                self.max_carry_weight,
                1.0..=100000.0,
            ),
            health: readers::read_number(field(raw, "health"), self.health, VITAL),
            magicka: readers::read_number(field(raw, "magicka"), self.magicka, VITAL),
            stamina: readers::read_number(field(raw, "stamina"), self.stamina, VITAL),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertData {
    pub health_pct: f64,
    pub magicka_pct: f64,
    pub stamina_pct: f64,
    pub carry_pct: f64,
}

impl Default for AlertData {
    fn default() -> Self {
        Self {
            health_pct: 100.0,
            magicka_pct: 100.0,
            stamina_pct: 100.0,
            carry_pct: 0.0,
        }
    }
}

impl AlertData {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            health_pct: readers::read_number(field(raw, "healthPct"), self.health_pct, ALERT_PCT),
            magicka_pct: readers::read_number(field(raw, "magickaPct"), self.magicka_pct, ALERT_PCT),
            stamina_pct: readers::read_number(field(raw, "staminaPct"), self.stamina_pct, ALERT_PCT),
            carry_pct: readers::read_number(field(raw, "carryPct"), self.carry_pct, ALERT_PCT),
        }
    }
}

/// How the host derived the displayed numbers (raw values, caps, clamp flags).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationMeta {
    pub raw_resistances: Resistances,
    pub raw_crit_chance: f64,
    pub raw_damage_reduction: f64,
    pub armor_cap_for_max_reduction: f64,
    pub caps: CalculationCaps,
    pub flags: CalculationFlags,
}

impl Default for CalculationMeta {
    fn default() -> Self {
        Self {
            raw_resistances: Resistances::default(),
            raw_crit_chance: 0.0,
            raw_damage_reduction: 0.0,
            armor_cap_for_max_reduction: 666.67,
            caps: CalculationCaps::default(),
            flags: CalculationFlags::default(),
        }
    }
}

impl CalculationMeta {
    pub(crate) fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            raw_resistances: self.raw_resistances.patch(child_object(raw, "rawResistances")),
            raw_crit_chance: readers::read_number(field(raw, "rawCritChance"), self.raw_crit_chance, PERCENT),
            raw_damage_reduction: readers::read_number(
                field(raw, "rawDamageReduction"),
                self.raw_damage_reduction,
                PERCENT,
            ),
            armor_cap_for_max_reduction: readers::read_number(
                field(raw, "armorCapForMaxReduction"),
                self.armor_cap_for_max_reduction,
                0.0..=100000.0,
            ),
            caps: self.caps.patch(child_object(raw, "caps")),
            flags: self.flags.patch(child_object(raw, "flags")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationCaps {
    pub elemental_resist: f64,
    pub elemental_resist_min: f64,
    pub disease_resist: f64,
    pub disease_resist_min: f64,
    pub crit_chance: f64,
    pub damage_reduction: f64,
}

impl Default for CalculationCaps {
    fn default() -> Self {
        Self {
            elemental_resist: 85.0,
            elemental_resist_min: -100.0,
            disease_resist: 100.0,
            disease_resist_min: 0.0,
            crit_chance: 100.0,
            damage_reduction: 80.0,
        }
    }
}

impl CalculationCaps {
    fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            elemental_resist: readers::read_number(field(raw, "elementalResist"), self.elemental_resist, CAP),
            elemental_resist_min: readers::read_number(
                field(raw, "elementalResistMin"),
                self.elemental_resist_min,
                RESIST,
            ),
            disease_resist: readers::read_number(field(raw, "diseaseResist"), self.disease_resist, CAP),
            disease_resist_min: readers::read_number(
                field(raw, "diseaseResistMin"),
                self.disease_resist_min,
                RESIST,
            ),
            crit_chance: readers::read_number(field(raw, "critChance"), self.crit_chance, CAP),
            damage_reduction: readers::read_number(field(raw, "damageReduction"), self.damage_reduction, CAP),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationFlags {
    pub any_resistance_clamped: bool,
    pub crit_chance_clamped: bool,
    pub damage_reduction_clamped: bool,
}

impl CalculationFlags {
    fn patch(&self, raw: Option<&Object>) -> Self {
        Self {
            any_resistance_clamped: readers::read_bool(
                field(raw, "anyResistanceClamped"),
                self.any_resistance_clamped,
            ),
            crit_chance_clamped: readers::read_bool(field(raw, "critChanceClamped"), self.crit_chance_clamped),
            damage_reduction_clamped: readers::read_bool(
                field(raw, "damageReductionClamped"),
                self.damage_reduction_clamped,
            ),
        }
    }
}
