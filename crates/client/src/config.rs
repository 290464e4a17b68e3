//! Replay configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use overlay_core::{SnapConfig, SnapTieBreak};
use overlay_runtime::OverlayConfig;

/// Configuration for one replay session.
#[derive(Clone, Debug)]
pub struct ReplayConfig {
    pub debounce_ms: u64,
    pub snap_threshold: f64,
    pub grid: f64,
    pub viewport_width: f64,
    pub tie_break: SnapTieBreak,
    /// Directory for the log file; logs go to stderr when unset.
    pub log_dir: Option<PathBuf>,
    /// Transcript to replay; stdin when unset.
    pub transcript: Option<PathBuf>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        let overlay = OverlayConfig::default();
        Self {
            debounce_ms: overlay.debounce.as_millis() as u64,
            snap_threshold: overlay.snap.threshold,
            grid: overlay.snap.grid,
            viewport_width: overlay.viewport_width,
            tie_break: overlay.snap.tie_break,
            log_dir: None,
            transcript: None,
        }
    }
}

impl ReplayConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `OVERLAY_DEBOUNCE_MS` - Quiet period before settings are written (default: 200)
    /// - `OVERLAY_SNAP_THRESHOLD` - Neighbor snap distance in pixels (default: 15)
    /// - `OVERLAY_GRID` - Grid size in pixels, 0 disables (default: 10)
    /// - `OVERLAY_VIEWPORT_WIDTH` - Width used for default widget layout (default: 1920)
    /// - `OVERLAY_SNAP_TIE_BREAK` - `nearest` or `first-in-order` (default: nearest)
    /// - `OVERLAY_LOG_DIR` - Write logs to `<dir>/overlay.log` instead of stderr
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ReplayConfig::from_env`] against an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = read_var::<u64>(&lookup, "OVERLAY_DEBOUNCE_MS") {
            config.debounce_ms = ms;
        }
        if let Some(threshold) = read_var::<f64>(&lookup, "OVERLAY_SNAP_THRESHOLD").filter(|t| t.is_finite() && *t >= 0.0)
        {
            config.snap_threshold = threshold;
        }
        if let Some(grid) = read_var::<f64>(&lookup, "OVERLAY_GRID").filter(|g| g.is_finite()) {
            config.grid = grid;
        }
        if let Some(width) = read_var::<f64>(&lookup, "OVERLAY_VIEWPORT_WIDTH").filter(|w| w.is_finite() && *w > 0.0) {
            config.viewport_width = width;
        }
        if let Some(tie_break) = read_var::<SnapTieBreak>(&lookup, "OVERLAY_SNAP_TIE_BREAK") {
            config.tie_break = tie_break;
        }
        config.log_dir = lookup("OVERLAY_LOG_DIR").filter(|dir| !dir.is_empty()).map(PathBuf::from);

        config
    }

    pub fn with_transcript(mut self, path: Option<PathBuf>) -> Self {
        self.transcript = path;
        self
    }

    pub fn overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            snap: SnapConfig::default()
                .with_threshold(self.snap_threshold)
                .with_grid(self.grid)
                .with_tie_break(self.tie_break),
            viewport_width: self.viewport_width,
            ..OverlayConfig::default()
        }
    }
}

fn read_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_mirror_overlay_config() {
        let config = ReplayConfig::from_lookup(lookup(&[]));

        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.snap_threshold, 15.0);
        assert_eq!(config.grid, 10.0);
        assert_eq!(config.tie_break, SnapTieBreak::Nearest);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let config = ReplayConfig::from_lookup(lookup(&[
            ("OVERLAY_DEBOUNCE_MS", "50"),
            ("OVERLAY_GRID", "0"),
            ("OVERLAY_SNAP_TIE_BREAK", "first-in-order"),
            ("OVERLAY_LOG_DIR", "/tmp/overlay"),
        ]));
        let overlay = config.overlay_config();

        assert_eq!(overlay.debounce, Duration::from_millis(50));
        assert_eq!(overlay.snap.grid, 0.0);
        assert_eq!(overlay.snap.tie_break, SnapTieBreak::FirstInOrder);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/overlay")));
    }

    #[test]
    fn unparsable_values_are_ignored() {
        let config = ReplayConfig::from_lookup(lookup(&[
            ("OVERLAY_DEBOUNCE_MS", "soon"),
            ("OVERLAY_SNAP_THRESHOLD", "-4"),
            ("OVERLAY_VIEWPORT_WIDTH", "0"),
            ("OVERLAY_SNAP_TIE_BREAK", "random"),
        ]));

        assert_eq!(config.debounce_ms, 200);
        assert_eq!(config.snap_threshold, 15.0);
        assert_eq!(config.viewport_width, 1920.0);
        assert_eq!(config.tie_break, SnapTieBreak::Nearest);
    }
}
