//! Topic-based event bus for overlay state changes.
//!
//! The worker publishes every outcome it handles; consumers subscribe only
//! to the topics they render or record.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{SettingsEvent, SettingsSource, StatsEvent, SyncEvent, UiEvent};
