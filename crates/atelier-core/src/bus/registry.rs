//! Event bus implementation.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::events::{Event, Topic};
use super::fault::{panic_message, FaultReporter, SubscriberFault, TracingReporter};
use crate::error::format_error_chain;

/// Return type of every subscriber callback.
pub type HandlerResult = anyhow::Result<()>;

type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

/// Identifies one registration on one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sub(#{})", self.0)
    }
}

struct Entry {
    id: SubscriptionId,
    handler: Handler,
}

struct BusInner {
    registry: Mutex<HashMap<Topic, Vec<Entry>>>,
    next_id: AtomicU64,
    reporter: Arc<dyn FaultReporter>,
}

impl BusInner {
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, topic: Topic, entry: Entry) {
        self.registry.lock().entry(topic).or_default().push(entry);
    }

    fn remove(&self, topic: &Topic, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock();
        let Some(entries) = registry.get_mut(topic) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|e| e.id == id) else {
            return false;
        };
        // `Vec::remove` keeps the remaining subscribers in order.
        entries.remove(pos);
        if entries.is_empty() {
            registry.remove(topic);
        }
        true
    }

    fn snapshot(&self, topic: &Topic) -> Vec<Handler> {
        self.registry
            .lock()
            .get(topic)
            .map(|entries| entries.iter().map(|e| e.handler.clone()).collect())
            .unwrap_or_default()
    }
}

/// Publish/subscribe registry shared by every storefront component.
///
/// Cloning is cheap and every clone talks to the same registry. There is no
/// global instance; whoever owns the page session constructs one and hands
/// it to the collaborators.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a bus that logs subscriber faults through `tracing`.
    pub fn new() -> Self {
        Self::with_reporter(Arc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Arc<dyn FaultReporter>) -> Self {
        Self {
            inner: Arc::new(BusInner {
                registry: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                reporter,
            }),
        }
    }

    /// Append `handler` to the topic's subscribers.
    pub fn subscribe<F>(&self, topic: impl Into<Topic>, handler: F) -> Subscription
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = self.inner.next_id();
        self.inner.insert(
            topic.clone(),
            Entry {
                id,
                handler: Arc::new(handler),
            },
        );
        tracing::debug!(%topic, subscription = %id, "subscription added");
        self.handle(topic, id)
    }

    /// Like [`subscribe`](Self::subscribe), but the handler runs at most
    /// once and then removes itself, even if it publishes to its own topic
    /// while running.
    pub fn subscribe_once<F>(&self, topic: impl Into<Topic>, handler: F) -> Subscription
    where
        F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = self.inner.next_id();
        let fired = AtomicBool::new(false);
        let bus = Arc::downgrade(&self.inner);
        let own_topic = topic.clone();

        let wrapped = move |event: &Event| {
            if fired.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            // Dropped after the handler returns or unwinds.
            let _remove = RemoveOnDrop {
                bus: bus.clone(),
                topic: own_topic.clone(),
                id,
            };
            handler(event)
        };

        self.inner.insert(
            topic.clone(),
            Entry {
                id,
                handler: Arc::new(wrapped),
            },
        );
        tracing::debug!(%topic, subscription = %id, "one-shot subscription added");
        self.handle(topic, id)
    }

    /// Deliver `event` to every subscriber of its topic, in subscription
    /// order. Returns how many subscribers handled it without fault.
    pub fn publish(&self, event: Event) -> usize {
        let topic = event.topic();
        let handlers = self.inner.snapshot(&topic);
        if handlers.is_empty() {
            tracing::trace!(%topic, "publish with no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for handler in handlers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&event)));
            let error = match outcome {
                Ok(Ok(())) => {
                    delivered += 1;
                    continue;
                }
                Ok(Err(err)) => format_error_chain(&*err),
                Err(payload) => panic_message(payload),
            };
            self.inner.reporter.report(&SubscriberFault {
                topic: topic.clone(),
                error,
            });
        }
        delivered
    }

    /// Publish an untyped payload on an arbitrary topic.
    pub fn publish_raw(&self, topic: impl Into<Topic>, payload: Option<serde_json::Value>) -> usize {
        self.publish(Event::custom(topic, payload))
    }

    /// Drop the subscribers of one topic, or of every topic when `None`.
    pub fn clear(&self, topic: Option<&Topic>) {
        let mut registry = self.inner.registry.lock();
        match topic {
            Some(topic) => {
                registry.remove(topic);
            }
            None => registry.clear(),
        }
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.inner.registry.lock().get(topic).map_or(0, Vec::len)
    }

    /// Number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.inner
            .registry
            .lock()
            .values()
            .filter(|entries| !entries.is_empty())
            .count()
    }

    fn handle(&self, topic: Topic, id: SubscriptionId) -> Subscription {
        Subscription {
            bus: Arc::downgrade(&self.inner),
            topic,
            id,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.topic_count())
            .finish()
    }
}

/// Capability to remove exactly one subscription.
///
/// Dropping the handle leaves the subscription in place, and the handle
/// does not keep the bus alive.
#[derive(Debug, Clone)]
pub struct Subscription {
    bus: Weak<BusInner>,
    topic: Topic,
    id: SubscriptionId,
}

impl Subscription {
    /// Remove the subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let removed = bus.remove(&self.topic, self.id);
        if removed {
            tracing::debug!(topic = %self.topic, subscription = %self.id, "subscription removed");
        }
        removed
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

struct RemoveOnDrop {
    bus: Weak<BusInner>,
    topic: Topic,
    id: SubscriptionId,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(&self.topic, self.id);
        }
    }
}
