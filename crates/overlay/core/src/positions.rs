//! Draggable widget placement: neighbor snapping with a grid fallback.
//!
//! Position precedence for a group is: in-progress drag, persisted setting,
//! built-in default, configured fallback. Only a completed drag is written
//! back to settings.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::debug;

use crate::settings::{self, GroupPosition, Settings};

/// Horizontal offset of the right-hand column from the viewport's right edge.
const RIGHT_COLUMN_INSET: f64 = 260.0;

/// Built-in widget groups, in snap-candidate order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum WidgetGroupId {
    Experience,
    PlayerInfo,
    Resistances,
    Defense,
    Offense,
    Equipped,
    Time,
    TimedEffects,
    Movement,
}

impl WidgetGroupId {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn default_position(self, viewport_width: f64) -> GroupPosition {
        let right = viewport_width - RIGHT_COLUMN_INSET;
        match self {
            WidgetGroupId::PlayerInfo => GroupPosition::new(right, 20.0),
            WidgetGroupId::Experience => GroupPosition::new(right, 180.0),
            WidgetGroupId::Time => GroupPosition::new(20.0, 20.0),
            WidgetGroupId::Resistances => GroupPosition::new(right, 220.0),
            WidgetGroupId::Defense => GroupPosition::new(right, 500.0),
            WidgetGroupId::Offense => GroupPosition::new(right, 630.0),
            WidgetGroupId::Equipped => GroupPosition::new(right, 760.0),
            WidgetGroupId::TimedEffects => GroupPosition::new(right, 900.0),
            WidgetGroupId::Movement => GroupPosition::new(right, 1030.0),
        }
    }
}

/// Which neighbor wins when several are within the snap threshold on one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SnapTieBreak {
    /// The first candidate in group order. Reproduces the renderer's
    /// first-match scan, so positions come out identical to what it computes.
    FirstInOrder,
    /// The closest candidate; equal distances fall back to group order.
    #[default]
    Nearest,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SnapConfig {
    /// Strict upper bound on the per-axis distance that snaps to a neighbor.
    pub threshold: f64,
    pub grid: f64,
    pub fallback: GroupPosition,
    pub tie_break: SnapTieBreak,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            threshold: 15.0,
            grid: 10.0,
            fallback: GroupPosition::new(20.0, 20.0),
            tie_break: SnapTieBreak::default(),
        }
    }
}

impl SnapConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_grid(mut self, grid: f64) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_tie_break(mut self, tie_break: SnapTieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Snaps one axis against candidate neighbor coordinates, or rounds to the grid.
    fn snap_axis(&self, raw: f64, candidates: impl Iterator<Item = f64>) -> f64 {
        let mut best: Option<(f64, f64)> = None;
        for candidate in candidates {
            let distance = (raw - candidate).abs();
            if distance >= self.threshold {
                continue;
            }
            match self.tie_break {
                SnapTieBreak::FirstInOrder => return candidate,
                SnapTieBreak::Nearest => {
                    if best.is_none_or(|(closest, _)| distance < closest) {
                        best = Some((distance, candidate));
                    }
                }
            }
        }

        match best {
            Some((_, snapped)) => snapped,
            None => self.round_to_grid(raw),
        }
    }

    fn round_to_grid(&self, value: f64) -> f64 {
        if self.grid <= 0.0 {
            return value;
        }
        // Half-way values round up, matching how the renderer rounds.
        (value / self.grid + 0.5).floor() * self.grid
    }
}

/// Resolves and tracks widget group positions.
#[derive(Clone, Debug)]
pub struct WidgetPositions {
    config: SnapConfig,
    order: Vec<String>,
    defaults: HashMap<String, GroupPosition>,
    dragging: HashMap<String, GroupPosition>,
}

impl WidgetPositions {
    /// Resolver over an explicit group list; iteration order is snap-candidate order.
    pub fn new<I, S>(config: SnapConfig, groups: I) -> Self
    where
        I: IntoIterator<Item = (S, GroupPosition)>,
        S: Into<String>,
    {
        let mut order = Vec::new();
        let mut defaults = HashMap::new();
        for (group, position) in groups {
            let group = group.into();
            if defaults.insert(group.clone(), position).is_none() {
                order.push(group);
            }
        }
        Self {
            config,
            order,
            defaults,
            dragging: HashMap::new(),
        }
    }

    /// Resolver over the nine built-in groups laid out for `viewport_width`.
    pub fn builtin(config: SnapConfig, viewport_width: f64) -> Self {
        Self::new(
            config,
            WidgetGroupId::iter().map(|group| (group.as_str(), group.default_position(viewport_width))),
        )
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn is_dragging(&self, group: &str) -> bool {
        self.dragging.contains_key(group)
    }

    pub fn resolve(&self, group: &str, persisted: &Settings) -> GroupPosition {
        self.dragging
            .get(group)
            .or_else(|| persisted.positions.get(group))
            .or_else(|| self.defaults.get(group))
            .copied()
            .unwrap_or(self.config.fallback)
    }

    /// Records an in-progress drag and returns the snapped position shown for it.
    pub fn on_drag(&mut self, group: &str, raw_x: f64, raw_y: f64, persisted: &Settings) -> GroupPosition {
        if !(raw_x.is_finite() && raw_y.is_finite()) {
            return self.resolve(group, persisted);
        }
        let snapped = self.snap(group, raw_x, raw_y, persisted);
        self.dragging.insert(group.to_owned(), snapped);
        snapped
    }

    /// Ends a drag and persists the snapped position through [`settings::update`].
    pub fn on_drag_end(&mut self, group: &str, raw_x: f64, raw_y: f64, settings: &Arc<Settings>) -> Arc<Settings> {
        if !(raw_x.is_finite() && raw_y.is_finite()) {
            self.cancel_drag(group);
            return Arc::clone(settings);
        }
        // Siblings still see this group's live drag position until it is removed.
        let snapped = self.snap(group, raw_x, raw_y, settings);
        self.dragging.remove(group);
        debug!(target: "overlay::positions", group, x = snapped.x, y = snapped.y, "persisting widget position");
        settings::update(
            settings,
            &format!("positions.{group}"),
            json!({ "x": snapped.x, "y": snapped.y }),
        )
    }

    /// Drops an interrupted drag without persisting it.
    pub fn cancel_drag(&mut self, group: &str) -> bool {
        self.dragging.remove(group).is_some()
    }

    fn snap(&self, group: &str, raw_x: f64, raw_y: f64, persisted: &Settings) -> GroupPosition {
        let neighbors: Vec<GroupPosition> = self
            .order
            .iter()
            .filter(|other| other.as_str() != group)
            .map(|other| self.resolve(other, persisted))
            .collect();

        GroupPosition::new(
            self.config.snap_axis(raw_x, neighbors.iter().map(|p| p.x)),
            self.config.snap_axis(raw_y, neighbors.iter().map(|p| p.y)),
        )
    }
}
