//! Error types for the event bus.

use thiserror::Error;

use crate::pubsub::{ListenerId, PublisherId};

pub type Result<T> = std::result::Result<T, EventError>;

/// Errors raised by event bus operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    /// Unsubscribing a listener that was never subscribed.
    #[error("listener {listener} is not subscribed to publisher {publisher}")]
    NotSubscribed {
        listener: ListenerId,
        publisher: PublisherId,
    },

    #[error("event type must not be empty")]
    EmptyEventType,

    #[error("event topic already exists: {0}")]
    DuplicateTopic(String),
}
