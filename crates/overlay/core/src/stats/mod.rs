//! Combat stats: the validated snapshot model and its reconciler.
//!
//! The host pushes full or partial snapshots in arbitrary order. The
//! reconciler drops anything whose `seq` does not advance, then merges the
//! rest group by group over the previous state:
//!
//! - [`MergePolicy::Patch`] groups merge leaf by leaf, so a partial payload
//!   only touches the leaves it carries.
//! - [`MergePolicy::Replace`] groups (`time`, `timedEffects`) are kept verbatim
//!   when absent and rebuilt from scratch when present.

mod policy;
mod reconcile;
mod state;

pub use policy::{MergePolicy, StatsGroup};
pub use reconcile::{StatsOutcome, StatsReconciler, merge_combat_state};
pub use state::{
    AlertData, CalculationCaps, CalculationFlags, CalculationMeta, CombatState, Defense, Equipped,
    GameTime, MONTH_NAMES, Movement, Offense, PlayerInfo, Resistances,
};
