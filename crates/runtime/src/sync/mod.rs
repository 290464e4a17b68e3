//! Outbound settings synchronization.
//!
//! Local edits are coalesced by [`SyncDebouncer`] on top of a
//! [`SingleSlotTimer`], so the host sees one write per burst of changes.

mod debouncer;
mod timer;

pub use debouncer::SyncDebouncer;
pub use timer::SingleSlotTimer;
