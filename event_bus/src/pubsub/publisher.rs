//! Event publishers.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::{Listen, ListenerId, PublisherId, Subscriber};
use crate::error::{EventError, Result};
use crate::events::Event;

/// Shared publisher state: the subscriber side of every subscription.
pub(crate) struct PublisherCore {
    id: PublisherId,
    subscribers: RefCell<BTreeMap<ListenerId, Rc<dyn Subscriber>>>,
}

impl PublisherCore {
    fn new() -> Self {
        Self {
            id: PublisherId::new(),
            subscribers: RefCell::new(BTreeMap::new()),
        }
    }

    /// Remove one subscriber entry. The listener's back-reference is left
    /// to the caller.
    pub(crate) fn detach(&self, listener: ListenerId) -> Option<Rc<dyn Subscriber>> {
        self.subscribers.borrow_mut().remove(&listener)
    }

    /// Subscribers at this instant. Delivery iterates the copy so that
    /// handlers may (un)subscribe while an event is in flight.
    fn snapshot(&self) -> Vec<Rc<dyn Subscriber>> {
        self.subscribers.borrow().values().cloned().collect()
    }

    pub(crate) fn broadcast(&self, event: &Event) {
        let subscribers = self.snapshot();
        trace!(
            publisher = %self.id,
            event_type = %event.event_type(),
            count = subscribers.len(),
            "Broadcasting event"
        );
        for subscriber in subscribers {
            subscriber.on_notify(event);
        }
    }

    fn teardown(&self) {
        let subscribers = std::mem::take(&mut *self.subscribers.borrow_mut());
        for subscriber in subscribers.values() {
            subscriber.remove_event_publisher(self.id);
        }
        if !subscribers.is_empty() {
            debug!(publisher = %self.id, count = subscribers.len(), "Publisher detached all subscribers");
        }
    }
}

/// Non-owning link to a publisher, held in a listener's back-reference map.
///
/// Dropping a link never tears anything down; only the owning
/// [`EventPublisher`] does.
#[derive(Clone)]
pub struct PublisherLink(pub(crate) Rc<PublisherCore>);

impl PublisherLink {
    /// ID of the linked publisher.
    pub fn id(&self) -> PublisherId {
        self.0.id
    }

    pub(crate) fn broadcast(&self, event: &Event) {
        self.0.broadcast(event);
    }
}

impl std::fmt::Debug for PublisherLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublisherLink").field(&self.0.id).finish()
    }
}

/// Holds a set of subscribed listeners and delivers events to them.
pub struct EventPublisher {
    core: Rc<PublisherCore>,
}

impl EventPublisher {
    /// Create a publisher with no subscribers.
    pub fn new() -> Self {
        Self {
            core: Rc::new(PublisherCore::new()),
        }
    }

    /// Stable ID used as the key in every listener's back-reference map.
    pub fn id(&self) -> PublisherId {
        self.core.id
    }

    pub(crate) fn link(&self) -> PublisherLink {
        PublisherLink(Rc::clone(&self.core))
    }

    /// Subscribe a listener. This is the one entry point that establishes
    /// both sides of a subscription. Subscribing twice is a no-op.
    pub fn add_event_listener(&self, listener: &dyn Listen) {
        let subscriber = listener.subscriber();
        let listener_id = subscriber.listener_id();

        {
            let mut subscribers = self.core.subscribers.borrow_mut();
            if subscribers.contains_key(&listener_id) {
                return;
            }
            subscribers.insert(listener_id, Rc::clone(&subscriber));
        }
        subscriber.add_event_publisher(self.link());
        debug!(publisher = %self.id(), listener = %listener_id, "Listener subscribed");
    }

    /// Unsubscribe a listener, clearing both sides.
    ///
    /// Fails if the listener was never subscribed.
    pub fn remove_event_listener(&self, listener: &dyn Listen) -> Result<()> {
        let listener_id = listener.listener_id();
        match self.core.detach(listener_id) {
            Some(subscriber) => {
                subscriber.remove_event_publisher(self.id());
                debug!(publisher = %self.id(), listener = %listener_id, "Listener unsubscribed");
                Ok(())
            }
            None => {
                warn!(publisher = %self.id(), listener = %listener_id, "Tried to remove unknown listener");
                Err(EventError::NotSubscribed {
                    listener: listener_id,
                    publisher: self.id(),
                })
            }
        }
    }

    /// Broadcast an event to every current subscriber.
    ///
    /// Delivery order is unspecified.
    pub fn notify(&self, event: &Event) {
        self.core.broadcast(event);
    }

    /// Deliver an event to one listener or topic, bypassing the subscriber set.
    pub fn notify_to(&self, event: &Event, target: &dyn Listen) {
        target.subscriber().on_notify(event);
    }

    /// IDs of the current subscribers.
    pub fn subscriber_ids(&self) -> Vec<ListenerId> {
        self.core.subscribers.borrow().keys().copied().collect()
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.core.subscribers.borrow().len()
    }

    /// Check if a listener is subscribed.
    pub fn has_subscriber(&self, listener: ListenerId) -> bool {
        self.core.subscribers.borrow().contains_key(&listener)
    }

    /// Detach every subscriber, on both sides. Safe to call repeatedly.
    pub fn on_destroy(&self) {
        self.core.teardown();
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventPublisher {
    fn drop(&mut self) {
        self.core.teardown();
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("id", &self.id())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
