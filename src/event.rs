//! Event delivery between the decode-loop thread and the consumer.
//!
//! Three independent streams (result, partial, error), each a single slot
//! holding at most one attached sink. Delivery is live-only: an empty slot
//! drops the payload without buffering, and a send never blocks the
//! producer. Consumers drain the receiving end of the channel on their own
//! thread or executor.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::debug;

use crate::engine::RecognitionListener;

/// Runtime recognition failure reported on the error stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEvent {
    pub code: String,
    pub message: String,
}

impl ErrorEvent {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A single attach/detach-able consumer slot.
///
/// Attach can race with deliver from the decode-loop thread, so the slot is
/// mutex-guarded. Sends are unbounded and never block while the lock is
/// held.
struct Slot<T> {
    sink: Mutex<Option<Sender<T>>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            sink: Mutex::new(None),
        }
    }

    fn attach(&self, sink: Sender<T>) {
        *self.lock() = Some(sink);
    }

    fn detach(&self) {
        *self.lock() = None;
    }

    fn deliver(&self, payload: T) {
        let mut slot = self.lock();
        if let Some(sink) = slot.as_ref() {
            if sink.send(payload).is_err() {
                // Receiver hung up without detaching; treat as detached.
                *slot = None;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Sender<T>>> {
        // A poisoned slot only means a consumer panicked mid-attach; the
        // producer must keep delivering regardless.
        self.sink.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// The three outbound streams of a recognition session.
pub struct EventBus {
    result: Slot<String>,
    partial: Slot<String>,
    error: Slot<ErrorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            result: Slot::new(),
            partial: Slot::new(),
            error: Slot::new(),
        }
    }

    /// Attach a sink for final results, replacing any previous one.
    pub fn attach_result(&self, sink: Sender<String>) {
        self.result.attach(sink);
    }

    /// Attach a sink for partial hypotheses, replacing any previous one.
    pub fn attach_partial(&self, sink: Sender<String>) {
        self.partial.attach(sink);
    }

    /// Attach a sink for runtime recognition errors, replacing any previous
    /// one.
    pub fn attach_error(&self, sink: Sender<ErrorEvent>) {
        self.error.attach(sink);
    }

    pub fn detach_result(&self) {
        self.result.detach();
    }

    pub fn detach_partial(&self) {
        self.partial.detach();
    }

    pub fn detach_error(&self) {
        self.error.detach();
    }

    pub(crate) fn publish_result(&self, text: String) {
        self.result.deliver(text);
    }

    pub(crate) fn publish_partial(&self, text: String) {
        self.partial.deliver(text);
    }

    pub(crate) fn publish_error(&self, event: ErrorEvent) {
        self.error.deliver(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Forwards engine callbacks into the bus.
///
/// Invoked on the decode-loop thread only; every call is a non-blocking
/// channel send, so the loop is never stalled by a slow consumer.
pub struct EventRelay {
    bus: Arc<EventBus>,
}

impl EventRelay {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

impl RecognitionListener for EventRelay {
    fn on_partial(&self, text: &str) {
        self.bus.publish_partial(text.to_string());
    }

    fn on_result(&self, text: &str) {
        self.bus.publish_result(text.to_string());
    }

    fn on_final(&self, text: &str) {
        self.bus.publish_result(text.to_string());
    }

    fn on_error(&self, code: &str, message: &str) {
        self.bus.publish_error(ErrorEvent::new(code, message));
    }

    fn on_timeout(&self) {
        // Reporting-only hook: no session transition is mapped to it.
        debug!("engine reported a listening timeout");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_deliver_without_sink_drops() {
        let bus = EventBus::new();
        // Must not block or panic with nothing attached.
        bus.publish_result("dropped".into());
        bus.publish_partial("dropped".into());
        bus.publish_error(ErrorEvent::new("RECOGNITION_ERROR", "dropped"));
    }

    #[test]
    fn test_attach_then_deliver_in_order() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        bus.attach_partial(tx);

        bus.publish_partial("hel".into());
        bus.publish_partial("hello".into());

        assert_eq!(rx.recv().unwrap(), "hel");
        assert_eq!(rx.recv().unwrap(), "hello");
    }

    #[test]
    fn test_detach_stops_delivery() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        bus.attach_result(tx);
        bus.publish_result("one".into());
        bus.detach_result();
        bus.publish_result("two".into());

        assert_eq!(rx.recv().unwrap(), "one");
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_attach_replaces_previous_sink() {
        let bus = EventBus::new();
        let (tx1, rx1) = mpsc::channel();
        let (tx2, rx2) = mpsc::channel();
        bus.attach_result(tx1);
        bus.attach_result(tx2);
        bus.publish_result("latest".into());

        assert!(rx1.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(rx2.recv().unwrap(), "latest");
    }

    #[test]
    fn test_hung_up_receiver_is_treated_as_detached() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        bus.attach_error(tx);
        drop(rx);
        // Both deliveries must be silently dropped.
        bus.publish_error(ErrorEvent::new("RECOGNITION_ERROR", "gone"));
        bus.publish_error(ErrorEvent::new("RECOGNITION_ERROR", "still gone"));
    }

    #[test]
    fn test_relay_routes_final_to_result_stream() {
        let bus = Arc::new(EventBus::new());
        let (tx, rx) = mpsc::channel();
        bus.attach_result(tx);

        let relay = EventRelay::new(bus);
        relay.on_result("first");
        relay.on_final("last");

        assert_eq!(rx.recv().unwrap(), "first");
        assert_eq!(rx.recv().unwrap(), "last");
    }
}
