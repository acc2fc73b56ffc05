//! Event stream - the registry of topics by name.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{EventError, Result};
use crate::events::Event;
use crate::pubsub::EventTopic;

/// Keeps track of topics so events can be routed to a channel by name.
#[derive(Debug, Default)]
pub struct EventStream {
    topics: BTreeMap<String, EventTopic>,
}

impl EventStream {
    /// Create a new empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a topic.
    ///
    /// Returns `false` without touching the stream if the name is taken.
    pub fn add_topic(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.topics.contains_key(&name) {
            debug!(topic = %name, "Topic already exists");
            return false;
        }
        let topic = EventTopic::new(name.clone());
        self.topics.insert(name, topic);
        true
    }

    /// Register a topic built elsewhere.
    pub fn insert_topic(&mut self, topic: EventTopic) -> Result<()> {
        if self.topics.contains_key(topic.name()) {
            return Err(EventError::DuplicateTopic(topic.name().to_string()));
        }
        self.topics.insert(topic.name().to_string(), topic);
        Ok(())
    }

    /// Unregister a topic. Absent names are ignored.
    ///
    /// Dropping the returned topic tears down its subscriptions.
    pub fn remove_topic(&mut self, name: &str) -> Option<EventTopic> {
        self.topics.remove(name)
    }

    /// Look up a topic by name.
    pub fn topic(&self, name: &str) -> Option<&EventTopic> {
        self.topics.get(name)
    }

    /// Check if a topic is registered.
    pub fn has_topic(&self, name: &str) -> bool {
        self.topics.contains_key(name)
    }

    /// Deliver an event to the subscribers of one topic.
    ///
    /// Returns `false` if no topic has that name.
    pub fn notify(&self, event: &Event, topic: &str) -> bool {
        match self.topics.get(topic) {
            Some(topic) => {
                topic.notify(event);
                true
            }
            None => false,
        }
    }

    /// Deliver an event through every topic.
    pub fn broadcast(&self, event: &Event) {
        for topic in self.topics.values() {
            topic.notify(event);
        }
    }

    /// Deliver an event through each named topic. Unknown names are
    /// skipped; returns how many topics were reached.
    pub fn multicast<'a>(&self, event: &Event, topics: impl IntoIterator<Item = &'a str>) -> usize {
        topics
            .into_iter()
            .filter(|name| self.notify(event, name))
            .count()
    }

    /// Get all registered topic names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Number of registered topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Check if the stream has no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventData, EventType};
    use crate::pubsub::EventListener;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (EventListener, Rc<Cell<u32>>) {
        let listener = EventListener::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        listener.on(EventType::Applied, move |_| seen.set(seen.get() + 1));
        (listener, count)
    }

    fn applied() -> Event {
        Event::new(EventType::Applied, EventData::new())
    }

    #[test]
    fn test_add_topic_unique() {
        let mut stream = EventStream::new();

        assert!(stream.add_topic("combat"));
        assert!(!stream.add_topic("combat"));
        assert_eq!(stream.len(), 1);
        assert!(stream.has_topic("combat"));
        assert!(!stream.has_topic("Combat"));
    }

    #[test]
    fn test_duplicate_add_keeps_subscriptions() {
        let mut stream = EventStream::new();
        let (listener, count) = counter();

        stream.add_topic("combat");
        stream.topic("combat").unwrap().add_event_listener(&listener);
        assert!(!stream.add_topic("combat"));

        assert!(stream.notify(&applied(), "combat"));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_insert_topic_duplicate() {
        let mut stream = EventStream::new();
        stream.insert_topic(EventTopic::new("chat")).unwrap();

        let err = stream.insert_topic(EventTopic::new("chat")).unwrap_err();
        assert_eq!(err, EventError::DuplicateTopic("chat".to_string()));
    }

    #[test]
    fn test_remove_topic_idempotent() {
        let mut stream = EventStream::new();
        let (listener, _) = counter();
        stream.add_topic("weather");
        stream.topic("weather").unwrap().add_event_listener(&listener);

        assert!(stream.remove_topic("weather").is_some());
        assert!(stream.remove_topic("weather").is_none());
        assert!(!stream.has_topic("weather"));
        assert!(stream.is_empty());
        assert!(listener.publisher_ids().is_empty());
    }

    #[test]
    fn test_notify_unknown_topic() {
        let stream = EventStream::new();
        assert!(!stream.notify(&applied(), "nowhere"));
    }

    #[test]
    fn test_broadcast_and_multicast() {
        let mut stream = EventStream::new();
        let (a, a_count) = counter();
        let (b, b_count) = counter();

        stream.add_topic("a");
        stream.add_topic("b");
        stream.topic("a").unwrap().add_event_listener(&a);
        stream.topic("b").unwrap().add_event_listener(&b);

        stream.broadcast(&applied());
        assert_eq!((a_count.get(), b_count.get()), (1, 1));

        let reached = stream.multicast(&applied(), ["a", "missing"]);
        assert_eq!(reached, 1);
        assert_eq!((a_count.get(), b_count.get()), (2, 1));
    }

    #[test]
    fn test_names_sorted() {
        let mut stream = EventStream::new();
        stream.add_topic("zeta");
        stream.add_topic("alpha");

        let names: Vec<_> = stream.names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
