//! Per-group merge policy for stats snapshots.

use strum::{EnumIter, IntoStaticStr};

/// How a top-level group of an incoming snapshot combines with the previous state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergePolicy {
    /// Leaf-wise: each missing or invalid leaf keeps its previous value.
    Patch,
    /// Whole-group: absent keeps the previous group verbatim, present rebuilds it.
    Replace,
}

/// Top-level groups of a [`CombatState`](super::CombatState) snapshot, keyed by wire name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum StatsGroup {
    Resistances,
    Defense,
    Offense,
    Equipped,
    Movement,
    Time,
    PlayerInfo,
    AlertData,
    TimedEffects,
    CalcMeta,
    IsInCombat,
}

impl StatsGroup {
    /// JSON key of the group.
    pub fn key(self) -> &'static str {
        self.into()
    }

    pub const fn policy(self) -> MergePolicy {
        match self {
            StatsGroup::Time | StatsGroup::TimedEffects => MergePolicy::Replace,
            StatsGroup::Resistances
            | StatsGroup::Defense
            | StatsGroup::Offense
            | StatsGroup::Equipped
            | StatsGroup::Movement
            | StatsGroup::PlayerInfo
            | StatsGroup::AlertData
            | StatsGroup::CalcMeta
            | StatsGroup::IsInCombat => MergePolicy::Patch,
        }
    }
}
