//! Runtime orchestration for the overlay state-sync core.
//!
//! This crate wires the pure reconcilers from `overlay-core` into a running
//! overlay: a bridge the host calls into, a single worker task that owns all
//! state, and a debounced channel back to the host. Consumers embed
//! [`Overlay`] and interact with it through [`OverlayHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`bridge`] holds the host-facing callback registry
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`sync`] debounces outbound settings writes
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod bridge;
pub mod events;
pub mod runtime;
pub mod sync;

mod workers;

pub use api::{OverlayError, OverlayHandle, OverlayView, Result, SyncStatus};
pub use bridge::{BridgeAddress, BridgeArg, BridgeRegistry, HostSink, InboundCall, OutboundCall, Registration};
pub use events::{Event, EventBus, SettingsEvent, SettingsSource, StatsEvent, SyncEvent, Topic, UiEvent};
pub use runtime::{Overlay, OverlayBuilder, OverlayConfig};
pub use sync::{SingleSlotTimer, SyncDebouncer};
