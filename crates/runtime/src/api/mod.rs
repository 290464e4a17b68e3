//! Public API surface for overlay consumers.
//!
//! Re-exports the handle, snapshot and error types so clients can depend on
//! a single module.
mod errors;
mod handle;
mod view;

pub use errors::{OverlayError, Result};
pub use handle::OverlayHandle;
pub use view::{OverlayView, SyncStatus};
