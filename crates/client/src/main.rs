//! Overlay replay binary.
//!
//! Plays a recorded host transcript through the overlay bridge.
//!
//! ```bash
//! # From a file
//! cargo run -p overlay-client -- session.jsonl
//!
//! # From stdin, logging to a directory
//! OVERLAY_LOG_DIR=logs cargo run -p overlay-client < session.jsonl
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use overlay_client::{ReplayConfig, install_outbound_echo, load_transcript, logging, read_transcript, render_view, replay};
use overlay_runtime::Overlay;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Load configuration
    let config = ReplayConfig::from_env().with_transcript(std::env::args_os().nth(1).map(PathBuf::from));

    // 2. Setup logging; the guard flushes the file writer on exit
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    // 3. Read the whole transcript before starting the overlay
    let entries = match &config.transcript {
        Some(path) => load_transcript(path)?,
        None => read_transcript(io::stdin().lock())?,
    };
    tracing::info!(entries = entries.len(), "transcript loaded");

    // 4. Start the overlay with host callbacks echoing to stdout
    let overlay = Overlay::builder().config(config.overlay_config()).build();
    let _echo = install_outbound_echo(overlay.bridge());

    // 5. Replay, then report final state
    let summary = replay(overlay.bridge(), &entries).await;
    let view = overlay.handle().view().await?;
    print!("{}", render_view(&view));
    if !summary.unhandled.is_empty() {
        tracing::warn!(unhandled = ?summary.unhandled, "some calls had no handler");
    }

    overlay.shutdown().await?;
    tracing::info!(delivered = summary.delivered, "replay complete");
    Ok(())
}
