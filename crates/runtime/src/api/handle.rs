//! Cloneable façade for issuing commands to the overlay worker.
//!
//! [`OverlayHandle`] hides channel plumbing and offers async helpers for
//! local edits, drags and view snapshots.
use std::sync::Arc;

use overlay_core::Settings;
use overlay_core::settings::GroupPosition;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use super::errors::{OverlayError, Result};
use super::view::OverlayView;
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to interact with the overlay
#[derive(Clone)]
pub struct OverlayHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    event_bus: EventBus,
}

impl OverlayHandle {
    pub(crate) fn new(command_tx: mpsc::UnboundedSender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Enqueues a command without waiting; used by host-facing bridge handlers.
    pub(crate) fn dispatch(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            debug!(target: "overlay::api", "overlay worker stopped; dropping command");
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| OverlayError::CommandChannelClosed)
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx))?;
        reply_rx.await.map_err(OverlayError::ReplyChannelClosed)
    }

    /// Edits one setting by dot-delimited path and returns the resulting snapshot.
    ///
    /// With `persist` the change is queued for a debounced host write.
    pub async fn update_setting(&self, path: impl Into<String>, value: Value, persist: bool) -> Result<Arc<Settings>> {
        let path = path.into();
        self.request(|reply| Command::UpdateSetting {
            path,
            value,
            persist,
            reply,
        })
        .await
    }

    /// Moves a widget group mid-drag; returns the snapped position shown for it.
    pub async fn drag(&self, group: &str, x: f64, y: f64) -> Result<GroupPosition> {
        let group = group.to_owned();
        self.request(|reply| Command::Drag { group, x, y, reply }).await
    }

    /// Finishes a drag and persists the snapped position.
    pub async fn drag_end(&self, group: &str, x: f64, y: f64) -> Result<GroupPosition> {
        let group = group.to_owned();
        self.request(|reply| Command::DragEnd { group, x, y, reply }).await
    }

    /// Abandons an interrupted drag; returns whether one was in progress.
    pub async fn cancel_drag(&self, group: &str) -> Result<bool> {
        let group = group.to_owned();
        self.request(|reply| Command::CancelDrag { group, reply }).await
    }

    pub async fn resolve_position(&self, group: &str) -> Result<GroupPosition> {
        let group = group.to_owned();
        self.request(|reply| Command::ResolvePosition { group, reply }).await
    }

    /// Closes the settings panel from the UI and asks the host to release focus.
    pub fn close_settings(&self) -> Result<()> {
        self.send(Command::CloseSettings { request_unfocus: true })
    }

    /// Sends the current settings to the host's export callback.
    pub async fn export_settings(&self) -> Result<()> {
        self.request(|reply| Command::ExportSettings { reply }).await?
    }

    /// Emits any pending debounced write immediately; returns whether one was pending.
    pub async fn flush_sync(&self) -> Result<bool> {
        self.request(|reply| Command::FlushSync { reply }).await
    }

    /// Snapshot of everything the renderer shows.
    pub async fn view(&self) -> Result<OverlayView> {
        self.request(|reply| Command::QueryView { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Stats` - inbound stats outcomes
    /// - `Topic::Settings` - applied, stale, rejected and edited settings
    /// - `Topic::Ui` - panel, visibility and color changes
    /// - `Topic::Sync` - host persistence results
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
