use parking_lot::Mutex;
use std::any::Any;

use super::events::Topic;

/// A subscriber returned an error or panicked while handling `topic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFault {
    pub topic: Topic,
    pub error: String,
}

/// Sink for subscriber faults, injected at bus construction.
pub trait FaultReporter: Send + Sync {
    fn report(&self, fault: &SubscriberFault);
}

/// Logs every fault at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FaultReporter for TracingReporter {
    fn report(&self, fault: &SubscriberFault) {
        tracing::error!(
            topic = %fault.topic,
            error = %fault.error,
            "error in event handler"
        );
    }
}

/// Keeps faults in memory so callers can inspect them later.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    faults: Mutex<Vec<SubscriberFault>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> Vec<SubscriberFault> {
        self.faults.lock().clone()
    }

    pub fn take(&self) -> Vec<SubscriberFault> {
        std::mem::take(&mut *self.faults.lock())
    }
}

impl FaultReporter for CollectingReporter {
    fn report(&self, fault: &SubscriberFault) {
        self.faults.lock().push(fault.clone());
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
