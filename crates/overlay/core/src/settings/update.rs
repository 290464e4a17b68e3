//! Path-addressed copy-on-write edits.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::model::Settings;

/// Replaces the value at a dot-delimited `path` (e.g. `general.opacity`).
///
/// Returns `previous` itself (pointer-equal) when nothing changed: a missing
/// or non-object intermediate segment, a value that fails validation, or an
/// edit that leaves every field as it was. Otherwise returns a new validated
/// snapshot.
pub fn update(previous: &Arc<Settings>, path: &str, value: Value) -> Arc<Settings> {
    let mut tree = match serde_json::to_value(previous.as_ref()) {
        Ok(tree) => tree,
        Err(error) => {
            warn!(target: "overlay::settings", %error, "failed to serialize settings for update");
            return Arc::clone(previous);
        }
    };

    let Some(slot) = slot_at(&mut tree, path) else {
        debug!(target: "overlay::settings", path, "settings path does not resolve to an object");
        return Arc::clone(previous);
    };
    *slot = value;

    let Some(edited) = tree.as_object() else {
        return Arc::clone(previous);
    };
    let next = Settings::overlay(previous, edited);
    if next == **previous {
        return Arc::clone(previous);
    }
    Arc::new(next)
}

/// Walks every segment but the last through nested objects and returns the leaf slot.
fn slot_at<'a>(tree: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };

    let mut cursor = tree.as_object_mut()?;
    for segment in parents.into_iter().flat_map(|parents| parents.split('.')) {
        cursor = cursor.get_mut(segment)?.as_object_mut()?;
    }
    Some(cursor.entry(leaf).or_insert(Value::Null))
}
