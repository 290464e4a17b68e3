//! Inbound settings reconciliation with revision-based staleness handling.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::model::Settings;
use crate::error::{parse_payload, require_object};
use crate::readers;

/// Highest persisted settings layout this build understands.
pub const SCHEMA_VERSION: u64 = 1;

/// Result of reconciling one settings message.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingsOutcome {
    /// Defaults overlaid with the payload's valid fields.
    Applied { settings: Arc<Settings>, rev: Option<u64> },
    /// `rev` is older than the last applied one. Accepted as a no-op; `settings` is the previous value.
    Stale {
        settings: Arc<Settings>,
        rev: u64,
        watermark: u64,
    },
    /// Not JSON, or not a JSON object.
    Rejected,
}

impl SettingsOutcome {
    /// Whether the host should see this message as successfully handled.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SettingsOutcome::Rejected)
    }

    /// The settings in effect after this message, if it was accepted.
    pub fn settings(&self) -> Option<&Arc<Settings>> {
        match self {
            SettingsOutcome::Applied { settings, .. } | SettingsOutcome::Stale { settings, .. } => Some(settings),
            SettingsOutcome::Rejected => None,
        }
    }
}

/// Owns the revision watermark for the settings channel.
#[derive(Debug, Default)]
pub struct SettingsReconciler {
    last_applied_rev: Option<u64>,
    warned_schema: bool,
}

impl SettingsReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied_rev(&self) -> Option<u64> {
        self.last_applied_rev
    }

    /// Raises the watermark to `rev` (never lowers it).
    ///
    /// Called after the overlay itself emits `rev` so that older echoes from
    /// the host are recognized as stale.
    pub fn note_revision(&mut self, rev: u64) {
        self.last_applied_rev = Some(self.last_applied_rev.map_or(rev, |current| current.max(rev)));
    }

    pub fn parse_and_reconcile(&mut self, json: &str, previous: &Arc<Settings>) -> SettingsOutcome {
        match parse_payload(json) {
            Ok(raw) => self.reconcile(&raw, previous),
            Err(error) => {
                warn!(target: "overlay::settings", %error, "failed to parse settings payload");
                SettingsOutcome::Rejected
            }
        }
    }

    /// Reconciles a full settings payload.
    ///
    /// The result never inherits from `previous`: missing or invalid fields
    /// fall back to the static defaults.
    pub fn reconcile(&mut self, raw: &Value, previous: &Arc<Settings>) -> SettingsOutcome {
        let object = match require_object(raw) {
            Ok(object) => object,
            Err(error) => {
                warn!(target: "overlay::settings", %error, "rejecting settings payload");
                return SettingsOutcome::Rejected;
            }
        };

        let rev = readers::read_sequence(object.get("rev"));
        if let (Some(rev), Some(watermark)) = (rev, self.last_applied_rev)
            && rev < watermark
        {
            debug!(target: "overlay::settings", rev, watermark, "ignoring stale settings revision");
            return SettingsOutcome::Stale {
                settings: Arc::clone(previous),
                rev,
                watermark,
            };
        }

        if let Some(schema) = readers::read_sequence(object.get("schemaVersion"))
            && schema > SCHEMA_VERSION
            && !self.warned_schema
        {
            self.warned_schema = true;
            warn!(
                target: "overlay::settings",
                schema,
                supported = SCHEMA_VERSION,
                "settings written by a newer schema; unknown fields are ignored"
            );
        }

        let settings = Settings::overlay(&Settings::default(), object);
        if let Some(rev) = rev {
            self.note_revision(rev);
        }

        SettingsOutcome::Applied {
            settings: Arc::new(settings),
            rev,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::settings::WidgetSize;

    fn applied(outcome: SettingsOutcome) -> Arc<Settings> {
        match outcome {
            SettingsOutcome::Applied { settings, .. } => settings,
            other => panic!("expected applied settings, got {other:?}"),
        }
    }

    #[test]
    fn non_objects_are_rejected() {
        let mut reconciler = SettingsReconciler::new();
        let previous = Arc::new(Settings::default());

        assert_eq!(reconciler.reconcile(&json!("medium"), &previous), SettingsOutcome::Rejected);
        assert_eq!(reconciler.parse_and_reconcile("not json", &previous), SettingsOutcome::Rejected);
        assert!(!SettingsOutcome::Rejected.is_accepted());
    }

    #[test]
    fn full_reconcile_starts_from_defaults() {
        let mut reconciler = SettingsReconciler::new();
        let mut customized = Settings::default();
        customized.general.opacity = 40.0;
        let previous = Arc::new(customized);

        let settings = applied(reconciler.reconcile(&json!({"general": {"size": "large"}}), &previous));

        assert_eq!(settings.general.size, WidgetSize::Large);
        assert_eq!(settings.general.opacity, 70.0);
    }

    #[test]
    fn older_revision_is_accepted_without_change() {
        let mut reconciler = SettingsReconciler::new();
        let initial = Arc::new(Settings::default());
        let at_five = applied(reconciler.reconcile(&json!({"rev": 5, "general": {"opacity": 50}}), &initial));

        let outcome = reconciler.reconcile(&json!({"rev": 4, "general": {"opacity": 90}}), &at_five);

        assert!(outcome.is_accepted());
        assert!(matches!(outcome, SettingsOutcome::Stale { rev: 4, watermark: 5, .. }));
        assert!(Arc::ptr_eq(outcome.settings().unwrap(), &at_five));
    }

    #[test]
    fn equal_revision_reapplies() {
        let mut reconciler = SettingsReconciler::new();
        let initial = Arc::new(Settings::default());
        applied(reconciler.reconcile(&json!({"rev": 5}), &initial));

        let settings = applied(reconciler.reconcile(&json!({"rev": 5, "general": {"opacity": 50}}), &initial));

        assert_eq!(settings.general.opacity, 50.0);
    }

    #[test]
    fn noted_revision_marks_older_echoes_stale() {
        let mut reconciler = SettingsReconciler::new();
        let previous = Arc::new(Settings::default());
        reconciler.note_revision(8);
        reconciler.note_revision(3);

        assert_eq!(reconciler.last_applied_rev(), Some(8));
        assert!(matches!(
            reconciler.reconcile(&json!({"rev": 7}), &previous),
            SettingsOutcome::Stale { .. }
        ));
    }

    #[test]
    fn newer_schema_still_parses() {
        let mut reconciler = SettingsReconciler::new();
        let previous = Arc::new(Settings::default());

        let settings = applied(reconciler.reconcile(
            &json!({"schemaVersion": 3, "general": {"language": "en"}, "futureGroup": {}}),
            &previous,
        ));
        applied(reconciler.reconcile(&json!({"schemaVersion": 3}), &previous));

        assert_eq!(settings.general.language, crate::settings::Language::En);
        assert!(reconciler.warned_schema);
    }
}
