//! Typed event publishing.
//!
//! Engines publish their events to an [`EventBus`]. Observers run
//! synchronously in registration order; a panicking observer is logged and
//! skipped so the remaining observers still receive the event. Hosts that
//! prefer to drain events on their own schedule attach a channel instead.

use futures::channel::mpsc;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

pub trait Observer<E> {
    fn on_event(&mut self, event: &E);
}

impl<E, F: FnMut(&E)> Observer<E> for F {
    fn on_event(&mut self, event: &E) {
        self(event)
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct EventBus<E> {
    observers: Vec<(SubscriptionId, Box<dyn Observer<E> + Send>)>,
    channels: Vec<mpsc::UnboundedSender<E>>,
    next_id: u64,
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            channels: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, observer: impl Observer<E> + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    /// A receiver that gets a copy of every event published from now on.
    pub fn channel(&mut self) -> mpsc::UnboundedReceiver<E> {
        let (tx, rx) = mpsc::unbounded();
        self.channels.push(tx);
        rx
    }

    pub fn publish(&mut self, event: E) {
        for (id, observer) in &mut self.observers {
            let result = catch_unwind(AssertUnwindSafe(|| observer.on_event(&event)));
            if result.is_err() {
                tracing::warn!(subscription = id.0, "event observer panicked; continuing dispatch");
            }
        }
        // drop channels whose receiver is gone
        self.channels
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn has_listeners(&self) -> bool {
        !self.observers.is_empty() || !self.channels.is_empty()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .field("channels", &self.channels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            bus.subscribe(move |e: &u32| log.lock().unwrap().push(format!("{name}:{e}")));
        }
        bus.publish(7);
        assert_eq!(*log.lock().unwrap(), vec!["first:7", "second:7", "third:7"]);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let seen = Arc::new(Mutex::new(0));
        let mut bus = EventBus::new();
        bus.subscribe(|_: &u32| panic!("observer failure"));
        let counter = Arc::clone(&seen);
        bus.subscribe(move |_: &u32| *counter.lock().unwrap() += 1);

        bus.publish(1);
        bus.publish(2);
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus: EventBus<u32> = EventBus::new();
        let id = bus.subscribe(|_: &u32| {});
        assert_eq!(bus.observer_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(!bus.has_listeners());
    }

    #[test]
    fn test_channel_drain() {
        let mut bus = EventBus::new();
        let mut rx = bus.channel();
        bus.publish("a");
        bus.publish("b");
        assert_eq!(rx.try_next().unwrap(), Some("a"));
        assert_eq!(rx.try_next().unwrap(), Some("b"));
        assert!(rx.try_next().is_err());

        drop(rx);
        bus.publish("c");
        assert!(!bus.has_listeners());
    }
}
