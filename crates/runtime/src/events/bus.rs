//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use super::types::{SettingsEvent, StatsEvent, SyncEvent, UiEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum Topic {
    /// Inbound stats outcomes and liveness
    Stats,
    /// Settings applied, rejected or edited
    Settings,
    /// Panel, visibility and HUD color changes
    Ui,
    /// Host persistence round-trips
    Sync,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    Stats(StatsEvent),
    Settings(SettingsEvent),
    Ui(UiEvent),
    Sync(SyncEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Stats(_) => Topic::Stats,
            Event::Settings(_) => Topic::Settings,
            Event::Ui(_) => Topic::Ui,
            Event::Sync(_) => Topic::Sync,
        }
    }
}

struct Channels {
    stats: broadcast::Sender<Event>,
    settings: broadcast::Sender<Event>,
    ui: broadcast::Sender<Event>,
    sync: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Every topic has its own channel, created up front, so subscribing never
/// fails and consumers only receive the topics they asked for.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                stats: broadcast::channel(capacity).0,
                settings: broadcast::channel(capacity).0,
                ui: broadcast::channel(capacity).0,
                sync: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Stats => &self.channels.stats,
            Topic::Settings => &self.channels.settings,
            Topic::Ui => &self.channels.ui,
            Topic::Sync => &self.channels.sync,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "overlay::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut stats = bus.subscribe(Topic::Stats);
        let mut ui = bus.subscribe(Topic::Ui);

        bus.publish(Event::Ui(UiEvent::SettingsPanel { open: true }));
        bus.publish(Event::Stats(StatsEvent::NoData));

        assert_eq!(stats.recv().await.unwrap(), Event::Stats(StatsEvent::NoData));
        assert_eq!(ui.recv().await.unwrap(), Event::Ui(UiEvent::SettingsPanel { open: true }));
        assert!(stats.try_recv().is_err());
    }
}
