//! Replay harness for the overlay runtime.
//!
//! Stands in for the host: reads a JSON-lines transcript of bridge calls,
//! plays it into a running [`overlay_runtime::Overlay`] and prints every
//! outbound call the overlay makes.
//!
//! - [`config`] loads replay settings from the environment
//! - [`logging`] installs the tracing subscriber
//! - [`transcript`] parses transcript files
//! - [`replay`] drives the bridge and renders the final state

pub mod config;
pub mod logging;
pub mod replay;
pub mod transcript;

pub use config::ReplayConfig;
pub use replay::{ReplaySummary, install_outbound_echo, render_view, replay};
pub use transcript::{TranscriptEntry, load_transcript, read_transcript};
