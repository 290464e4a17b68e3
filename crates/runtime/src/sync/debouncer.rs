//! Coalesces local settings edits into one delayed, revision-tagged host write.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use overlay_core::Settings;
use serde::Serialize;
use tracing::{debug, trace};

use super::timer::SingleSlotTimer;
use crate::api::{OverlayError, Result};
use crate::bridge::HostSink;

/// Wire shape of a persisted settings write.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    #[serde(flatten)]
    settings: &'a Settings,
    schema_version: u64,
    rev: u64,
}

/// Payload waiting for the timer, kept with what produced it so identical
/// re-queues can be skipped.
#[derive(Debug)]
struct Pending {
    json: String,
    settings: Settings,
    explicit_revision: Option<u64>,
}

type PendingSlot = Arc<Mutex<Option<Pending>>>;

pub struct SyncDebouncer {
    delay: Duration,
    schema_version: u64,
    last_revision: u64,
    /// Whoever takes the payload out of the slot emits it.
    pending: PendingSlot,
    timer: SingleSlotTimer,
    sink: Arc<dyn HostSink>,
}

impl SyncDebouncer {
    pub fn new(delay: Duration, schema_version: u64, sink: Arc<dyn HostSink>) -> Self {
        Self {
            delay,
            schema_version,
            last_revision: 0,
            pending: Arc::new(Mutex::new(None)),
            timer: SingleSlotTimer::new(),
            sink,
        }
    }

    pub fn last_revision(&self) -> u64 {
        self.last_revision
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Queues `settings` for emission after the debounce delay.
    ///
    /// Returns the revision the payload carries, or `None` when it matches the
    /// payload still waiting to be sent and nothing was scheduled. Once a
    /// payload has been emitted, the same settings queue again under a fresh
    /// revision. A pending emission is replaced, so only the latest state
    /// within one delay window reaches the host.
    pub fn notify(&mut self, settings: &Settings, explicit_revision: Option<u64>) -> Result<Option<u64>> {
        let mut slot = lock(&self.pending);
        if slot
            .as_ref()
            .is_some_and(|queued| queued.explicit_revision == explicit_revision && queued.settings == *settings)
        {
            trace!(target: "overlay::sync", "settings unchanged since last queue; skipping");
            return Ok(None);
        }

        let rev = explicit_revision.unwrap_or(self.last_revision + 1);
        let json = serde_json::to_string(&Envelope {
            settings,
            schema_version: self.schema_version,
            rev,
        })
        .map_err(OverlayError::Serialize)?;

        self.last_revision = self.last_revision.max(rev);
        *slot = Some(Pending {
            json,
            settings: settings.clone(),
            explicit_revision,
        });
        drop(slot);

        let pending = Arc::clone(&self.pending);
        let sink = Arc::clone(&self.sink);
        self.timer.schedule(self.delay, move || {
            if let Some(queued) = lock(&pending).take() {
                debug!(target: "overlay::sync", rev, "emitting debounced settings");
                sink.on_settings_changed(queued.json);
            }
        });

        Ok(Some(rev))
    }

    /// Raises the revision counter so the next emission lands above `rev`.
    pub fn observe_revision(&mut self, rev: u64) {
        self.last_revision = self.last_revision.max(rev);
    }

    /// Emits the pending payload now; returns whether there was one.
    pub fn flush(&mut self) -> bool {
        self.timer.cancel();
        let Some(queued) = lock(&self.pending).take() else {
            return false;
        };
        debug!(target: "overlay::sync", "flushing pending settings");
        self.sink.on_settings_changed(queued.json);
        true
    }

    /// Drops the pending payload without emitting it.
    pub fn cancel(&mut self) -> bool {
        self.timer.cancel();
        lock(&self.pending).take().is_some()
    }
}

fn lock(pending: &Mutex<Option<Pending>>) -> MutexGuard<'_, Option<Pending>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Capture(Mutex<Vec<String>>);

    impl HostSink for Capture {
        fn on_settings_changed(&self, json: String) {
            self.0.lock().unwrap().push(json);
        }
        fn on_import_result(&self, _success: bool) {}
        fn on_export_settings(&self, _json: String) {}
        fn on_request_unfocus(&self, _reason: String) {}
    }

    #[tokio::test(start_paused = true)]
    async fn identical_payload_is_not_requeued() {
        let capture = Arc::new(Capture::default());
        let mut debouncer = SyncDebouncer::new(Duration::from_millis(200), 1, capture.clone());
        let settings = Settings::default();

        assert_eq!(debouncer.notify(&settings, None).unwrap(), Some(1));
        assert_eq!(debouncer.notify(&settings, None).unwrap(), None);
        assert_eq!(debouncer.notify(&settings, Some(9)).unwrap(), Some(9));
        assert_eq!(debouncer.last_revision(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn emitted_payload_does_not_block_requeue() {
        let capture = Arc::new(Capture::default());
        let mut debouncer = SyncDebouncer::new(Duration::from_millis(200), 1, capture.clone());
        let settings = Settings::default();

        assert_eq!(debouncer.notify(&settings, None).unwrap(), Some(1));
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(debouncer.notify(&settings, None).unwrap(), Some(2));
        assert!(debouncer.flush());

        let sent = capture.0.lock().unwrap();
        assert_eq!(sent.len(), 2);
        let last: serde_json::Value = serde_json::from_str(&sent[1]).unwrap();
        assert_eq!(last["rev"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_emits_once() {
        let capture = Arc::new(Capture::default());
        let mut debouncer = SyncDebouncer::new(Duration::from_millis(200), 1, capture.clone());

        debouncer.notify(&Settings::default(), Some(4)).unwrap();
        assert!(debouncer.flush());
        assert!(!debouncer.flush());
        tokio::time::sleep(Duration::from_millis(500)).await;

        let sent = capture.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(payload["rev"], 4);
        assert_eq!(payload["schemaVersion"], 1);
        assert_eq!(payload["general"]["opacity"], 70.0);
    }

    #[tokio::test(start_paused = true)]
    async fn observed_revision_raises_next_emission() {
        let capture = Arc::new(Capture::default());
        let mut debouncer = SyncDebouncer::new(Duration::from_millis(200), 1, capture.clone());

        debouncer.observe_revision(41);
        let rev = debouncer.notify(&Settings::default(), None).unwrap();

        assert_eq!(rev, Some(42));
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(capture.0.lock().unwrap().is_empty());
    }
}
