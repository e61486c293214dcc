//! Forwards theme editor lifecycle signals from the host page onto the bus.

use atelier_core::bus::{EditorSignal, Event, EventBus};

pub struct EditorBridge {
    bus: EventBus,
}

impl EditorBridge {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Republish `signal` under its `shopify:*` topic.
    pub fn forward(&self, signal: EditorSignal) -> usize {
        tracing::trace!(topic = %signal.topic(), "forwarding editor signal");
        self.bus.publish(Event::Editor(signal))
    }
}
