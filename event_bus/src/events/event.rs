//! Event records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EventType;
use crate::error::Result;

/// Payload of an event: named fields of arbitrary JSON data.
pub type EventData = serde_json::Map<String, Value>;

/// A named instance of typed data.
///
/// Events are immutable once they are handed to a publisher; the builder
/// methods consume the event and are meant for construction only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    event_type: EventType,
    data: EventData,
}

impl Event {
    /// Create an event of a known type.
    pub fn new(event_type: EventType, data: EventData) -> Self {
        Self { event_type, data }
    }

    /// Create an event from a raw type string, normalized to uppercase.
    pub fn create(event_type: &str, data: EventData) -> Result<Self> {
        Ok(Self::new(EventType::parse(event_type)?, data))
    }

    /// Add a field to the payload.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The normalized event type.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// The event payload.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Get a single payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}
