//! Event topics - named channels that are both listener and publisher.

use std::rc::Rc;

use super::listener::ListenerLinks;
use super::{EventPublisher, Listen, ListenerId, PublisherId, PublisherLink, Subscriber};
use crate::error::Result;
use crate::events::Event;

/// Listener side of a topic. Instead of a handler table it relays every
/// event to the topic's own subscribers.
struct TopicCore {
    links: ListenerLinks,
    relay: PublisherLink,
}

impl Subscriber for TopicCore {
    fn listener_id(&self) -> ListenerId {
        self.links.id()
    }

    fn on_notify(&self, event: &Event) {
        self.relay.broadcast(event);
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

/// A named pub/sub channel.
///
/// Publishers deliver to a topic with [`EventPublisher::notify_to`] (or by
/// subscribing it); the topic fans the event out, unchanged, to everyone
/// subscribed to it. Topics are normally created through an `EventStream`.
pub struct EventTopic {
    name: String,
    core: Rc<TopicCore>,
    publisher: EventPublisher,
}

impl EventTopic {
    /// Create an unconnected topic.
    pub fn new(name: impl Into<String>) -> Self {
        let publisher = EventPublisher::new();
        let core = Rc::new(TopicCore {
            links: ListenerLinks::new(),
            relay: publisher.link(),
        });
        Self {
            name: name.into(),
            core,
            publisher,
        }
    }

    /// Name under which the topic is registered in a stream.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ID of the listener half, as seen by upstream publishers.
    pub fn listener_id(&self) -> ListenerId {
        self.core.links.id()
    }

    /// ID of the publisher half, as seen by downstream listeners.
    pub fn publisher_id(&self) -> PublisherId {
        self.publisher.id()
    }

    /// The publishing half, for code that only needs to broadcast.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Relay an event to every subscriber of this topic.
    pub fn on_notify(&self, event: &Event) {
        self.core.on_notify(event);
    }

    /// Record a back-reference to an upstream publisher only.
    pub fn add_event_publisher(&self, publisher: &EventPublisher) {
        self.core.links.track(publisher.link());
    }

    /// Forget a back-reference to an upstream publisher only.
    pub fn remove_event_publisher(&self, publisher: PublisherId) {
        self.core.links.untrack(publisher);
    }

    /// Upstream publishers this topic is subscribed to.
    pub fn publisher_ids(&self) -> Vec<PublisherId> {
        self.core.links.publisher_ids()
    }

    /// Leave every upstream publisher and drop every downstream subscriber.
    pub fn on_destroy(&self) {
        self.core.links.teardown();
        self.publisher.on_destroy();
    }

    /// Subscribe a listener (or another topic) to this topic.
    pub fn add_event_listener(&self, listener: &dyn Listen) {
        self.publisher.add_event_listener(listener);
    }

    /// Unsubscribe a listener. Fails if it was never subscribed.
    pub fn remove_event_listener(&self, listener: &dyn Listen) -> Result<()> {
        self.publisher.remove_event_listener(listener)
    }

    /// Broadcast an event to this topic's subscribers.
    pub fn notify(&self, event: &Event) {
        self.publisher.notify(event);
    }

    /// Deliver an event to one target, bypassing the subscriber set.
    pub fn notify_to(&self, event: &Event, target: &dyn Listen) {
        self.publisher.notify_to(event, target);
    }

    /// IDs of this topic's subscribers.
    pub fn subscriber_ids(&self) -> Vec<ListenerId> {
        self.publisher.subscriber_ids()
    }

    /// Number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    /// Check if a listener is subscribed to this topic.
    pub fn has_subscriber(&self, listener: ListenerId) -> bool {
        self.publisher.has_subscriber(listener)
    }
}

impl Listen for EventTopic {
    fn subscriber(&self) -> Rc<dyn Subscriber> {
        self.core.clone()
    }
}

impl Drop for EventTopic {
    fn drop(&mut self) {
        // The publisher half tears itself down when the field drops.
        self.core.links.teardown();
    }
}

impl std::fmt::Debug for EventTopic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTopic")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .field("publishers", &self.publisher_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventData, EventType};
    use crate::pubsub::EventListener;
    use std::cell::RefCell;

    fn recording_listener(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> EventListener {
        let listener = EventListener::new();
        let sink = Rc::clone(log);
        listener.on(EventType::Custom("PING".to_string()), move |data| {
            let seq = data.get("seq").and_then(|v| v.as_i64()).unwrap_or_default();
            sink.borrow_mut().push(format!("{tag}:{seq}"));
        });
        listener
    }

    fn ping(seq: i64) -> Event {
        Event::create("ping", EventData::new()).unwrap().with_field("seq", seq)
    }

    #[test]
    fn test_topic_relays_to_subscribers_only() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let topic = EventTopic::new("combat");
        let inside = recording_listener(&log, "inside");
        let _outside = recording_listener(&log, "outside");

        topic.add_event_listener(&inside);
        topic.on_notify(&ping(1));

        assert_eq!(*log.borrow(), vec!["inside:1".to_string()]);
    }

    #[test]
    fn test_publisher_notify_to_topic() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let publisher = EventPublisher::new();
        let topic = EventTopic::new("loot");
        let a = recording_listener(&log, "a");
        let b = recording_listener(&log, "b");

        topic.add_event_listener(&a);
        topic.add_event_listener(&b);
        publisher.notify_to(&ping(7), &topic);

        let mut seen = log.borrow().clone();
        seen.sort();
        assert_eq!(seen, vec!["a:7".to_string(), "b:7".to_string()]);
    }

    #[test]
    fn test_topic_as_subscriber_of_publisher() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let publisher = EventPublisher::new();
        let topic = EventTopic::new("world");
        let listener = recording_listener(&log, "l");

        publisher.add_event_listener(&topic);
        topic.add_event_listener(&listener);
        publisher.notify(&ping(2));

        assert_eq!(*log.borrow(), vec!["l:2".to_string()]);
        assert!(topic.publisher_ids().contains(&publisher.id()));
        assert!(publisher.has_subscriber(topic.listener_id()));
    }

    #[test]
    fn test_publisher_half_shares_subscribers() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let topic = EventTopic::new("trade");
        let listener = recording_listener(&log, "buyer");

        topic.publisher().add_event_listener(&listener);
        assert!(topic.has_subscriber(listener.id()));
        assert_eq!(topic.publisher().id(), topic.publisher_id());

        topic.notify(&ping(4));
        assert_eq!(*log.borrow(), vec!["buyer:4".to_string()]);
    }

    #[test]
    fn test_topics_chain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let upstream = EventTopic::new("up");
        let downstream = EventTopic::new("down");
        let listener = recording_listener(&log, "end");

        upstream.add_event_listener(&downstream);
        downstream.add_event_listener(&listener);
        upstream.on_notify(&ping(3));

        assert_eq!(*log.borrow(), vec!["end:3".to_string()]);
    }

    #[test]
    fn test_drop_topic_clears_both_sides() {
        let publisher = EventPublisher::new();
        let listener = EventListener::new();
        {
            let topic = EventTopic::new("short-lived");
            publisher.add_event_listener(&topic);
            topic.add_event_listener(&listener);
            assert_eq!(listener.publisher_ids(), vec![topic.publisher_id()]);
        }

        assert_eq!(publisher.subscriber_count(), 0);
        assert!(listener.publisher_ids().is_empty());
    }
}
