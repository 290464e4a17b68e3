//! Host bridge: named callback slots in both directions.
//!
//! - [`registry`] holds the slot tables and RAII registrations
//! - [`handlers`] installs the overlay's inbound entry points
//! - [`host`] defines the outbound [`HostSink`] calls

pub mod handlers;
pub mod host;
pub mod registry;

pub use handlers::InboundCall;
pub use host::{HostSink, OutboundCall};
pub use registry::{BRIDGE_NAMESPACE, BRIDGE_VERSION, BridgeAddress, BridgeArg, BridgeRegistry, Handler, Registration};
