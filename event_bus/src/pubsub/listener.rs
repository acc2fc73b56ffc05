//! Event listeners - handler tables keyed by event type.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::{debug, trace};

use super::{EventPublisher, Handler, Listen, ListenerId, PublisherId, PublisherLink, Subscriber};
use crate::events::{Event, EventData, EventType};

/// Back-reference bookkeeping shared by listeners and topics.
pub(crate) struct ListenerLinks {
    id: ListenerId,
    publishers: RefCell<BTreeMap<PublisherId, PublisherLink>>,
}

impl ListenerLinks {
    pub(crate) fn new() -> Self {
        Self {
            id: ListenerId::new(),
            publishers: RefCell::new(BTreeMap::new()),
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn track(&self, publisher: PublisherLink) {
        self.publishers.borrow_mut().insert(publisher.id(), publisher);
    }

    pub(crate) fn untrack(&self, publisher: PublisherId) {
        self.publishers.borrow_mut().remove(&publisher);
    }

    pub(crate) fn publisher_ids(&self) -> Vec<PublisherId> {
        self.publishers.borrow().keys().copied().collect()
    }

    /// Leave every publisher, clearing both sides.
    pub(crate) fn teardown(&self) {
        let publishers = std::mem::take(&mut *self.publishers.borrow_mut());
        for publisher in publishers.values() {
            publisher.0.detach(self.id);
        }
        if !publishers.is_empty() {
            debug!(listener = %self.id, count = publishers.len(), "Listener left all publishers");
        }
    }
}

struct ListenerCore {
    links: ListenerLinks,
    handlers: RefCell<HashMap<EventType, Handler>>,
}

impl Subscriber for ListenerCore {
    fn listener_id(&self) -> ListenerId {
        self.links.id()
    }

    fn on_notify(&self, event: &Event) {
        // Clone the handler out so it can touch this listener's table.
        let handler = self.handlers.borrow().get(event.event_type()).cloned();
        match handler {
            Some(handler) => handler(event.data()),
            None => trace!(
                listener = %self.links.id(),
                event_type = %event.event_type(),
                "No handler bound, event dropped"
            ),
        }
    }

    fn add_event_publisher(&self, publisher: PublisherLink) {
        self.links.track(publisher);
    }

    fn remove_event_publisher(&self, publisher: PublisherId) {
        self.links.untrack(publisher);
    }

    fn publisher_ids(&self) -> Vec<PublisherId> {
        self.links.publisher_ids()
    }
}

/// Maps event types to handlers and receives events from the publishers it
/// is subscribed to.
///
/// At most one handler is bound per event type. Dropping the listener
/// unsubscribes it from every publisher.
pub struct EventListener {
    core: Rc<ListenerCore>,
}

impl EventListener {
    /// Create a listener with no handlers and no subscriptions.
    pub fn new() -> Self {
        Self {
            core: Rc::new(ListenerCore {
                links: ListenerLinks::new(),
                handlers: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Stable ID used as the key in every publisher's subscriber map.
    pub fn id(&self) -> ListenerId {
        self.core.links.id()
    }

    /// Bind a handler to an event type.
    ///
    /// Returns `false` and keeps the existing handler if the type is
    /// already bound.
    pub fn add_listener(&self, event_type: EventType, handler: Handler) -> bool {
        let mut handlers = self.core.handlers.borrow_mut();
        if handlers.contains_key(&event_type) {
            debug!(listener = %self.id(), %event_type, "Handler already bound, registration rejected");
            return false;
        }
        handlers.insert(event_type, handler);
        true
    }

    /// Bind a closure to an event type. See [`EventListener::add_listener`].
    pub fn on<F>(&self, event_type: EventType, handler: F) -> bool
    where
        F: Fn(&EventData) + 'static,
    {
        self.add_listener(event_type, Rc::new(handler))
    }

    /// Unbind the handler for an event type. Absent types are ignored.
    pub fn remove_listener(&self, event_type: &EventType) {
        self.core.handlers.borrow_mut().remove(event_type);
    }

    /// Check if a handler is bound for an event type.
    pub fn handles(&self, event_type: &EventType) -> bool {
        self.core.handlers.borrow().contains_key(event_type)
    }

    /// Number of event types with a bound handler.
    pub fn handler_count(&self) -> usize {
        self.core.handlers.borrow().len()
    }

    /// Dispatch an event to its handler, if one is bound.
    pub fn on_notify(&self, event: &Event) {
        self.core.on_notify(event);
    }

    /// Record a back-reference only; subscribing goes through
    /// [`EventPublisher::add_event_listener`].
    pub fn add_event_publisher(&self, publisher: &EventPublisher) {
        self.core.links.track(publisher.link());
    }

    /// Forget a back-reference only.
    pub fn remove_event_publisher(&self, publisher: PublisherId) {
        self.core.links.untrack(publisher);
    }

    /// Publishers this listener is currently subscribed to.
    pub fn publisher_ids(&self) -> Vec<PublisherId> {
        self.core.links.publisher_ids()
    }

    /// Check if this listener is subscribed to a publisher.
    pub fn is_subscribed_to(&self, publisher: PublisherId) -> bool {
        self.core.links.publishers.borrow().contains_key(&publisher)
    }

    /// Unsubscribe from every known publisher. Safe to call repeatedly.
    pub fn on_destroy(&self) {
        self.core.links.teardown();
    }
}

impl Listen for EventListener {
    fn subscriber(&self) -> Rc<dyn Subscriber> {
        self.core.clone()
    }
}

impl Default for EventListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        self.core.links.teardown();
    }
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.id())
            .field("handlers", &self.handler_count())
            .field("publishers", &self.publisher_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::cell::Cell;

    #[test]
    fn test_dispatch_to_matching_handler() {
        let listener = EventListener::new();
        let received = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&received);
        listener.on(EventType::Applied, move |data| {
            sink.borrow_mut().push(data.get("amount").cloned());
        });

        listener.on_notify(&Event::new(EventType::Applied, EventData::new()).with_field("amount", 3));
        listener.on_notify(&Event::new(EventType::Removed, EventData::new()));

        assert_eq!(*received.borrow(), vec![Some(Value::from(3))]);
    }

    #[test]
    fn test_duplicate_handler_rejected() {
        let listener = EventListener::new();
        let hits = Rc::new(Cell::new(0));

        let first = Rc::clone(&hits);
        assert!(listener.on(EventType::Refreshed, move |_| first.set(first.get() + 1)));
        let second = Rc::clone(&hits);
        assert!(!listener.on(EventType::Refreshed, move |_| second.set(second.get() + 100)));

        listener.on_notify(&Event::new(EventType::Refreshed, EventData::new()));
        assert_eq!(hits.get(), 1);
        assert_eq!(listener.handler_count(), 1);
    }

    #[test]
    fn test_remove_listener_idempotent() {
        let listener = EventListener::new();
        listener.on(EventType::Removed, |_| {});

        listener.remove_listener(&EventType::Removed);
        listener.remove_listener(&EventType::Removed);

        assert!(!listener.handles(&EventType::Removed));
        assert!(listener.on(EventType::Removed, |_| {}));
    }

    #[test]
    fn test_unmatched_event_is_dropped() {
        let listener = EventListener::new();
        listener.on_notify(&Event::create("whatever", EventData::new()).unwrap());
        assert_eq!(listener.handler_count(), 0);
    }

    #[test]
    fn test_handler_can_register_during_dispatch() {
        let listener = Rc::new(EventListener::new());
        let weak = Rc::downgrade(&listener);
        listener.on(EventType::Applied, move |_| {
            if let Some(l) = weak.upgrade() {
                l.on(EventType::Removed, |_| {});
            }
        });

        listener.on_notify(&Event::new(EventType::Applied, EventData::new()));
        assert!(listener.handles(&EventType::Removed));
    }

    #[test]
    fn test_back_reference_only() {
        let publisher = EventPublisher::new();
        let listener = EventListener::new();

        listener.add_event_publisher(&publisher);
        assert!(listener.is_subscribed_to(publisher.id()));
        assert!(!publisher.has_subscriber(listener.id()));

        listener.remove_event_publisher(publisher.id());
        assert!(listener.publisher_ids().is_empty());
    }

    #[test]
    fn test_on_destroy_leaves_all_publishers() {
        let a = EventPublisher::new();
        let b = EventPublisher::new();
        let listener = EventListener::new();

        a.add_event_listener(&listener);
        b.add_event_listener(&listener);
        listener.on_destroy();
        listener.on_destroy();

        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);
        assert!(listener.publisher_ids().is_empty());
    }

    #[test]
    fn test_drop_listener_unsubscribes() {
        let publisher = EventPublisher::new();
        {
            let listener = EventListener::new();
            publisher.add_event_listener(&listener);
            assert_eq!(publisher.subscriber_count(), 1);
        }
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
