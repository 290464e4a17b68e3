//! Worker tasks that back the overlay orchestration.
//!
//! A single overlay worker owns all state; every host call and local edit is
//! funneled through its command queue.

mod overlay;

pub use overlay::{Command, OverlayWorker, WorkerParts};
