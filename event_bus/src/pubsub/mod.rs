//! Publish/subscribe primitives.
//!
//! A subscription always has two sides: the publisher keeps the listener in
//! its subscriber map and the listener keeps the publisher in its
//! back-reference map. Both maps are keyed by stable IDs, and both sides are
//! cleared together on unsubscribe and on teardown.
//!
//! The owning handles (`EventListener`, `EventPublisher`, `EventTopic`) are
//! not `Clone`. Dropping one tears down every subscription it takes part in.

mod listener;
mod publisher;
mod topic;

pub use listener::*;
pub use publisher::*;
pub use topic::*;

use serde::{Deserialize, Serialize};
use std::rc::Rc;
use uuid::Uuid;

use crate::events::{Event, EventData};

/// Unique identifier for a listener (or the listener side of a topic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Create a new random listener ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a publisher (or the publisher side of a topic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublisherId(pub Uuid);

impl PublisherId {
    /// Create a new random publisher ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PublisherId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PublisherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reaction bound to one event type. Receives the event payload.
pub type Handler = Rc<dyn Fn(&EventData)>;

/// The receiving end of a subscription.
///
/// Implemented by plain listeners (dispatch through a handler table) and by
/// topics (relay to their own subscribers).
pub trait Subscriber {
    fn listener_id(&self) -> ListenerId;

    /// Deliver an event.
    fn on_notify(&self, event: &Event);

    /// Record the back-reference to a publisher. Does not subscribe.
    fn add_event_publisher(&self, publisher: PublisherLink);

    /// Forget the back-reference to a publisher. Does not unsubscribe.
    fn remove_event_publisher(&self, publisher: PublisherId);

    /// Publishers this subscriber holds back-references to.
    fn publisher_ids(&self) -> Vec<PublisherId>;
}

/// Anything that can stand wherever "a listener" is expected.
pub trait Listen {
    /// Shared receiving end, as stored in a publisher's subscriber map.
    fn subscriber(&self) -> Rc<dyn Subscriber>;

    fn listener_id(&self) -> ListenerId {
        self.subscriber().listener_id()
    }
}
