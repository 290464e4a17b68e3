//! Persisted overlay settings and their field-wise overlay onto a base.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{EnumString, IntoStaticStr};

use crate::readers::{self, Object, child_object, field};

/// Boolean toggle group merged key by key; unknown keys and non-bool values are ignored.
macro_rules! flag_group {
    ($(#[$meta:meta])* $name:ident { $($field:ident: $key:literal = $default:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
        pub struct $name {
            $(
                #[serde(rename = $key)]
                pub $field: bool,
            )+
        }

        impl Default for $name {
            fn default() -> Self {
                Self { $($field: $default,)+ }
            }
        }

        impl $name {
            pub(crate) fn overlay(&self, raw: Option<&Object>) -> Self {
                Self { $($field: readers::read_bool(field(raw, $key), self.$field),)+ }
            }
        }
    };
}

flag_group!(ResistanceFlags {
    magic: "magic" = true,
    fire: "fire" = true,
    frost: "frost" = true,
    shock: "shock" = true,
    poison: "poison" = true,
    disease: "disease" = false,
});

flag_group!(DefenseFlags {
    armor_rating: "armorRating" = true,
    damage_reduction: "damageReduction" = true,
});

flag_group!(OffenseFlags {
    right_hand_damage: "rightHandDamage" = true,
    left_hand_damage: "leftHandDamage" = true,
    crit_chance: "critChance" = true,
});

flag_group!(EquippedFlags {
    right_hand: "rightHand" = true,
    left_hand: "leftHand" = true,
});

flag_group!(MovementFlags {
    speed_mult: "speedMult" = true,
});

flag_group!(TimeFlags {
    game_date_time: "gameDateTime" = true,
    real_date_time: "realDateTime" = true,
});

flag_group!(
    /// Toggle for the dedicated experience widget.
    ExperienceFlags {
        enabled: "enabled" = true,
    }
);

flag_group!(PlayerInfoFlags {
    level: "level" = true,
    gold: "gold" = true,
    carry_weight: "carryWeight" = true,
    health: "health" = false,
    magicka: "magicka" = false,
    stamina: "stamina" = false,
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetSize {
    Xsmall,
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Ko,
    En,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, EnumString, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetLayout {
    Vertical,
    Horizontal,
}

/// Top-left corner of a widget group in viewport pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GroupPosition {
    pub x: f64,
    pub y: f64,
}

impl GroupPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Accepts `{x, y}` only when both coordinates are finite numbers.
    pub(crate) fn parse(raw: &serde_json::Value) -> Option<Self> {
        let object = readers::as_object(raw)?;
        let x = readers::finite(object.get("x"))?;
        let y = readers::finite(object.get("y"))?;
        Some(Self { x, y })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub visible: bool,
    pub combat_only: bool,
    pub show_on_change_only: bool,
    pub change_display_seconds: f64,
    pub onboarding_seen: bool,
    pub opacity: f64,
    pub size: WidgetSize,
    pub language: Language,
    /// Empty, or `#RRGGBB`.
    pub accent_color: String,
    pub transparent_bg: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            visible: true,
            combat_only: false,
            show_on_change_only: false,
            change_display_seconds: 4.0,
            onboarding_seen: false,
            opacity: 70.0,
            size: WidgetSize::Medium,
            language: Language::Ko,
            accent_color: String::new(),
            transparent_bg: true,
        }
    }
}

impl GeneralSettings {
    fn overlay(&self, raw: Option<&Object>) -> Self {
        Self {
            visible: readers::read_bool(field(raw, "visible"), self.visible),
            combat_only: readers::read_bool(field(raw, "combatOnly"), self.combat_only),
            show_on_change_only: readers::read_bool(field(raw, "showOnChangeOnly"), self.show_on_change_only),
            change_display_seconds: readers::read_number(
                field(raw, "changeDisplaySeconds"),
                self.change_display_seconds,
                1.0..=15.0,
            ),
            onboarding_seen: readers::read_bool(field(raw, "onboardingSeen"), self.onboarding_seen),
            opacity: readers::read_number(field(raw, "opacity"), self.opacity, 10.0..=100.0),
            size: readers::read_enum(field(raw, "size"), self.size),
            language: readers::read_enum(field(raw, "language"), self.language),
            accent_color: read_accent_color(field(raw, "accentColor"), &self.accent_color),
            transparent_bg: readers::read_bool(field(raw, "transparentBg"), self.transparent_bg),
        }
    }
}

fn read_accent_color(value: Option<&serde_json::Value>, fallback: &str) -> String {
    match value.and_then(serde_json::Value::as_str) {
        Some(text) if text.is_empty() || is_hex_color(text) => text.to_owned(),
        _ => fallback.to_owned(),
    }
}

fn is_hex_color(text: &str) -> bool {
    text.len() == 7
        && text.starts_with('#')
        && text[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEffectsSettings {
    pub enabled: bool,
    pub max_visible: f64,
}

impl Default for TimedEffectsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_visible: 6.0,
        }
    }
}

impl TimedEffectsSettings {
    fn overlay(&self, raw: Option<&Object>) -> Self {
        Self {
            enabled: readers::read_bool(field(raw, "enabled"), self.enabled),
            max_visible: readers::read_number(field(raw, "maxVisible"), self.max_visible, 1.0..=12.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAlerts {
    pub enabled: bool,
    pub low_health: bool,
    pub low_health_threshold: f64,
    pub low_stamina: bool,
    pub low_stamina_threshold: f64,
    pub low_magicka: bool,
    pub low_magicka_threshold: f64,
    pub overencumbered: bool,
}

impl Default for VisualAlerts {
    fn default() -> Self {
        Self {
            enabled: true,
            low_health: true,
            low_health_threshold: 30.0,
            low_stamina: true,
            low_stamina_threshold: 25.0,
            low_magicka: true,
            low_magicka_threshold: 25.0,
            overencumbered: true,
        }
    }
}

impl VisualAlerts {
    fn overlay(&self, raw: Option<&Object>) -> Self {
        const THRESHOLD: std::ops::RangeInclusive<f64> = 10.0..=60.0;
        Self {
            enabled: readers::read_bool(field(raw, "enabled"), self.enabled),
            low_health: readers::read_bool(field(raw, "lowHealth"), self.low_health),
            low_health_threshold: readers::read_number(
                field(raw, "lowHealthThreshold"),
                self.low_health_threshold,
                THRESHOLD,
            ),
            low_stamina: readers::read_bool(field(raw, "lowStamina"), self.low_stamina),
            low_stamina_threshold: readers::read_number(
                field(raw, "lowStaminaThreshold"),
                self.low_stamina_threshold,
                THRESHOLD,
            ),
            low_magicka: readers::read_bool(field(raw, "lowMagicka"), self.low_magicka),
            low_magicka_threshold: readers::read_number(
                field(raw, "lowMagickaThreshold"),
                self.low_magicka_threshold,
                THRESHOLD,
            ),
            overencumbered: readers::read_bool(field(raw, "overencumbered"), self.overencumbered),
        }
    }
}

/// Validated overlay configuration. Every field is always within range.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub general: GeneralSettings,
    pub resistances: ResistanceFlags,
    pub defense: DefenseFlags,
    pub offense: OffenseFlags,
    pub equipped: EquippedFlags,
    pub timed_effects: TimedEffectsSettings,
    pub movement: MovementFlags,
    pub time: TimeFlags,
    pub experience: ExperienceFlags,
    pub player_info: PlayerInfoFlags,
    pub visual_alerts: VisualAlerts,
    /// Sparse: groups without an entry use their built-in default.
    pub positions: BTreeMap<String, GroupPosition>,
    pub layouts: BTreeMap<String, WidgetLayout>,
}

impl Settings {
    /// Overlays every valid field of `raw` onto `base`.
    ///
    /// `positions` and `layouts` are whole-map values: when `raw` carries them
    /// they are rebuilt from it, otherwise they are cleared. An invalid entry
    /// keeps `base`'s entry for the same group, or is dropped if there is none.
    pub fn overlay(base: &Settings, raw: &Object) -> Settings {
        let raw = Some(raw);
        let mut experience = base.experience.overlay(child_object(raw, "experience"));
        if child_object(raw, "experience").is_none()
            && let Some(enabled) = legacy_experience_toggle(child_object(raw, "playerInfo"))
        {
            experience.enabled = enabled;
        }

        Settings {
            general: base.general.overlay(child_object(raw, "general")),
            resistances: base.resistances.overlay(child_object(raw, "resistances")),
            defense: base.defense.overlay(child_object(raw, "defense")),
            offense: base.offense.overlay(child_object(raw, "offense")),
            equipped: base.equipped.overlay(child_object(raw, "equipped")),
            timed_effects: base.timed_effects.overlay(child_object(raw, "timedEffects")),
            movement: base.movement.overlay(child_object(raw, "movement")),
            time: base.time.overlay(child_object(raw, "time")),
            experience,
            player_info: base.player_info.overlay(child_object(raw, "playerInfo")),
            visual_alerts: base.visual_alerts.overlay(child_object(raw, "visualAlerts")),
            positions: sanitize_positions(child_object(raw, "positions"), &base.positions),
            layouts: sanitize_layouts(child_object(raw, "layouts"), &base.layouts),
        }
    }
}

/// Older builds stored XP visibility as `playerInfo.experience` / `playerInfo.expToNextLevel`.
fn legacy_experience_toggle(player_info: Option<&Object>) -> Option<bool> {
    let current = field(player_info, "experience").and_then(serde_json::Value::as_bool);
    let to_next = field(player_info, "expToNextLevel").and_then(serde_json::Value::as_bool);
    if current.is_none() && to_next.is_none() {
        return None;
    }
    Some(current.unwrap_or(true) || to_next.unwrap_or(true))
}

fn sanitize_positions(
    raw: Option<&Object>,
    previous: &BTreeMap<String, GroupPosition>,
) -> BTreeMap<String, GroupPosition> {
    raw.into_iter()
        .flatten()
        .filter_map(|(group, value)| {
            let position = GroupPosition::parse(value).or_else(|| previous.get(group).copied())?;
            Some((group.clone(), position))
        })
        .collect()
}

fn sanitize_layouts(raw: Option<&Object>, previous: &BTreeMap<String, WidgetLayout>) -> BTreeMap<String, WidgetLayout> {
    raw.into_iter()
        .flatten()
        .filter_map(|(group, value)| {
            let layout = value
                .as_str()
                .and_then(|text| text.parse().ok())
                .or_else(|| previous.get(group).copied())?;
            Some((group.clone(), layout))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn overlay_defaults(raw: serde_json::Value) -> Settings {
        let raw = raw.as_object().cloned().unwrap_or_default();
        Settings::overlay(&Settings::default(), &raw)
    }

    #[test]
    fn size_accepts_xsmall_and_rejects_unknown() {
        let base = overlay_defaults(json!({"general": {"size": "xsmall"}}));
        assert_eq!(base.general.size, WidgetSize::Xsmall);

        let raw = json!({"general": {"size": "huge"}});
        let next = Settings::overlay(&base, raw.as_object().unwrap());
        assert_eq!(next.general.size, WidgetSize::Xsmall);
    }

    #[test]
    fn general_fields_clamp_and_validate() {
        let settings = overlay_defaults(json!({"general": {
            "opacity": 5,
            "changeDisplaySeconds": 99,
            "language": "fr",
            "accentColor": "#12ab9Z",
            "visible": "yes",
        }}));

        assert_eq!(settings.general.opacity, 10.0);
        assert_eq!(settings.general.change_display_seconds, 15.0);
        assert_eq!(settings.general.language, Language::Ko);
        assert_eq!(settings.general.accent_color, "");
        assert!(settings.general.visible);

        let accented = overlay_defaults(json!({"general": {"accentColor": "#12AB9f"}}));
        assert_eq!(accented.general.accent_color, "#12AB9f");
    }

    #[test]
    fn flag_groups_ignore_unknown_and_non_bool_keys() {
        let settings = overlay_defaults(json!({"resistances": {"disease": true, "fire": 0, "arcane": false}}));

        assert!(settings.resistances.disease);
        assert!(settings.resistances.fire);
    }

    #[test]
    fn thresholds_clamp_into_range() {
        let settings = overlay_defaults(json!({
            "visualAlerts": {"lowHealthThreshold": 80, "lowStaminaThreshold": 2},
            "timedEffects": {"maxVisible": 40},
        }));

        assert_eq!(settings.visual_alerts.low_health_threshold, 60.0);
        assert_eq!(settings.visual_alerts.low_stamina_threshold, 10.0);
        assert_eq!(settings.timed_effects.max_visible, 12.0);
    }

    #[test]
    fn legacy_xp_toggles_migrate() {
        let both_off = overlay_defaults(json!({"playerInfo": {"experience": false, "expToNextLevel": false}}));
        assert!(!both_off.experience.enabled);

        // A missing legacy toggle reads as enabled.
        let one_off = overlay_defaults(json!({"playerInfo": {"experience": false}}));
        assert!(one_off.experience.enabled);

        let explicit = overlay_defaults(json!({
            "experience": {"enabled": true},
            "playerInfo": {"experience": false, "expToNextLevel": false},
        }));
        assert!(explicit.experience.enabled);
    }

    #[test]
    fn positions_and_layouts_drop_invalid_entries() {
        let settings = overlay_defaults(json!({
            "positions": {
                "playerInfo": {"x": 10, "y": 20.5},
                "time": {"x": "1", "y": 2},
                "defense": [1, 2],
            },
            "layouts": {"playerInfo": "horizontal", "time": "diagonal"},
        }));

        assert_eq!(settings.positions.len(), 1);
        assert_eq!(settings.positions["playerInfo"], GroupPosition::new(10.0, 20.5));
        assert_eq!(settings.layouts.len(), 1);
        assert_eq!(settings.layouts["playerInfo"], WidgetLayout::Horizontal);
    }

    #[test]
    fn serializes_with_wire_names() {
        let value = serde_json::to_value(Settings::default()).unwrap();

        assert_eq!(value["general"]["size"], "medium");
        assert_eq!(value["playerInfo"]["carryWeight"], true);
        assert_eq!(value["visualAlerts"]["lowHealthThreshold"], 30.0);
        assert!(value["positions"].as_object().unwrap().is_empty());
    }
}
