//! JSON-lines transcripts of host bridge calls.
//!
//! One call per line:
//!
//! ```text
//! {"call": "updateStats", "arg": {"seq": 1, "playerInfo": {"gold": 10}}}
//! {"call": "Bridge.v1.toggleSettings", "waitMs": 250}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use overlay_runtime::BridgeArg;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    /// Legacy name or `Bridge.v1.<name>` path.
    pub call: String,
    #[serde(default)]
    pub arg: Value,
    /// Pause after the call, letting debounced writes fire.
    #[serde(default)]
    pub wait_ms: Option<u64>,
}

impl TranscriptEntry {
    pub fn bridge_arg(&self) -> BridgeArg {
        BridgeArg::from_json(&self.arg)
    }
}

/// Parses one transcript line; `None` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<TranscriptEntry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let entry = serde_json::from_str(line)?;
    Ok(Some(entry))
}

pub fn read_transcript(reader: impl BufRead) -> Result<Vec<TranscriptEntry>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read transcript")?;
        if let Some(entry) = parse_line(&line).with_context(|| format!("invalid transcript line {}", index + 1))? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

pub fn load_transcript(path: &Path) -> Result<Vec<TranscriptEntry>> {
    let file = File::open(path).with_context(|| format!("failed to open transcript {}", path.display()))?;
    read_transcript(BufReader::new(file))
}
