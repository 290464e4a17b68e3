//! High-level overlay orchestrator.
//!
//! The overlay owns the worker task, wires up the command queue and event bus,
//! installs the host-facing bridge handlers and exposes a builder-based API.
use std::sync::Arc;
use std::time::Duration;

use overlay_core::{SCHEMA_VERSION, Settings, SnapConfig, WidgetPositions};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{OverlayError, OverlayHandle, Result};
use crate::bridge::{BridgeRegistry, HostSink, Registration, handlers};
use crate::events::{Event, EventBus, Topic};
use crate::sync::SyncDebouncer;
use crate::workers::{Command, OverlayWorker, WorkerParts};

/// Overlay configuration shared across the orchestrator and worker.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Quiet period before a local edit is written to the host.
    pub debounce: Duration,
    pub snap: SnapConfig,
    /// Viewport width used to lay out built-in widget defaults.
    pub viewport_width: f64,
    /// Schema version stamped on outbound settings writes.
    pub schema_version: u64,
    /// HUD color used for the accent until the host reports one.
    pub initial_hud_color: String,
    pub event_buffer_size: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            snap: SnapConfig::default(),
            viewport_width: 1920.0,
            schema_version: SCHEMA_VERSION,
            initial_hud_color: "#ffffff".to_owned(),
            event_buffer_size: 100,
        }
    }
}

/// Running overlay.
///
/// Design: the overlay owns the worker and the bridge registrations.
/// [`OverlayHandle`] provides a cloneable façade for local consumers.
pub struct Overlay {
    handle: OverlayHandle,
    bridge: BridgeRegistry,
    registrations: Vec<Registration>,
    worker_handle: JoinHandle<()>,
}

impl Overlay {
    /// Create a new overlay builder
    pub fn builder() -> OverlayBuilder {
        OverlayBuilder::new()
    }

    /// Get a cloneable handle to this overlay
    pub fn handle(&self) -> OverlayHandle {
        self.handle.clone()
    }

    /// Registry the host calls into and installs its callbacks on.
    pub fn bridge(&self) -> &BridgeRegistry {
        &self.bridge
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the overlay gracefully
    ///
    /// Retracts every inbound handler from both addressing schemes, flushes
    /// a pending settings write and waits for the worker to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        for registration in &mut self.registrations {
            registration.unregister();
        }
        self.handle.dispatch(Command::Shutdown);
        self.worker_handle.await.map_err(OverlayError::WorkerJoin)?;
        info!(target: "overlay::runtime", "overlay shut down");
        Ok(())
    }
}

/// Builder for [`Overlay`] with flexible configuration.
pub struct OverlayBuilder {
    config: OverlayConfig,
    bridge: Option<BridgeRegistry>,
    host: Option<Arc<dyn HostSink>>,
    initial_settings: Option<Settings>,
}

impl OverlayBuilder {
    fn new() -> Self {
        Self {
            config: OverlayConfig::default(),
            bridge: None,
            host: None,
            initial_settings: None,
        }
    }

    /// Override overlay configuration
    pub fn config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing registry (e.g. one the host already populated).
    pub fn bridge(mut self, bridge: BridgeRegistry) -> Self {
        self.bridge = Some(bridge);
        self
    }

    /// Route outbound calls somewhere other than the bridge registry.
    pub fn host(mut self, host: Arc<dyn HostSink>) -> Self {
        self.host = Some(host);
        self
    }

    /// Settings in effect before the host pushes any.
    pub fn initial_settings(mut self, settings: Settings) -> Self {
        self.initial_settings = Some(settings);
        self
    }

    /// Build the overlay, spawning its worker on the current tokio runtime.
    pub fn build(self) -> Overlay {
        let bridge = self.bridge.unwrap_or_default();
        let host: Arc<dyn HostSink> = match self.host {
            Some(host) => host,
            None => Arc::new(bridge.clone()),
        };

        let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let handle = OverlayHandle::new(command_tx, event_bus.clone());

        let worker = OverlayWorker::new(
            WorkerParts {
                settings: self.initial_settings.unwrap_or_default(),
                hud_color: self.config.initial_hud_color.clone(),
                positions: WidgetPositions::builtin(self.config.snap.clone(), self.config.viewport_width),
                debouncer: SyncDebouncer::new(self.config.debounce, self.config.schema_version, Arc::clone(&host)),
                host,
            },
            command_rx,
            event_bus,
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        let registrations = handlers::install(&bridge, &handle);
        info!(
            target: "overlay::runtime",
            handlers = registrations.len(),
            debounce_ms = self.config.debounce.as_millis() as u64,
            "overlay started"
        );

        Overlay {
            handle,
            bridge,
            registrations,
            worker_handle,
        }
    }
}
