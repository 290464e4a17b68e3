//! Drives a running overlay from a transcript and reports what it produced.
use std::fmt::Write as _;
use std::time::Duration;

use overlay_runtime::{BridgeArg, BridgeRegistry, OutboundCall, OverlayView, Registration};
use strum::IntoEnumIterator;
use tracing::{debug, warn};

use crate::transcript::TranscriptEntry;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub delivered: usize,
    /// Calls that had no handler on either addressing scheme.
    pub unhandled: Vec<String>,
}

/// Plays `entries` against `bridge` in order.
pub async fn replay(bridge: &BridgeRegistry, entries: &[TranscriptEntry]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for entry in entries {
        if bridge.invoke_path(&entry.call, entry.bridge_arg()) {
            debug!(target: "overlay::replay", call = %entry.call, "delivered");
            summary.delivered += 1;
        } else {
            warn!(target: "overlay::replay", call = %entry.call, "no handler registered");
            summary.unhandled.push(entry.call.clone());
        }
        if let Some(ms) = entry.wait_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
    summary
}

/// Installs host-side callbacks that print every outbound call to stdout.
pub fn install_outbound_echo(bridge: &BridgeRegistry) -> Vec<Registration> {
    OutboundCall::iter()
        .map(|call| {
            bridge.register(call.name(), move |arg| {
                println!("<- {}({})", call.name(), describe_arg(&arg));
            })
        })
        .collect()
}

fn describe_arg(arg: &BridgeArg) -> String {
    match arg {
        BridgeArg::Empty => String::new(),
        BridgeArg::Text(text) => text.clone(),
        BridgeArg::Flag(flag) => flag.to_string(),
    }
}

/// Human-readable digest of the final overlay state.
pub fn render_view(view: &OverlayView) -> String {
    let mut out = String::new();
    let info = &view.stats.player_info;
    let _ = writeln!(
        out,
        "stats: {} (level {}, xp {}/{}, gold {})",
        if view.has_live_stats { "live" } else { "idle" },
        info.level,
        info.experience,
        info.next_level_total_xp,
        info.gold
    );
    for effect in &view.stats.timed_effects {
        let _ = writeln!(out, "  effect {} [{}s]", effect.display_name(), effect.remaining_sec);
    }
    let _ = writeln!(
        out,
        "ui: panel {}, widgets {}, accent {}",
        if view.settings_open { "open" } else { "closed" },
        if view.visible { "shown" } else { "hidden" },
        view.accent_color
    );
    let sync = &view.sync_status;
    let _ = writeln!(
        out,
        "sync: last rev {}, failures {}",
        sync.last_queued_rev.map_or_else(|| "-".to_owned(), |rev| rev.to_string()),
        sync.sync_failures
    );
    if let Some(diagnostics) = &view.runtime_diagnostics
        && diagnostics.has_warning()
    {
        let code: &str = diagnostics.warning_code.into();
        let _ = writeln!(out, "runtime warning: {code}");
    }
    out
}
