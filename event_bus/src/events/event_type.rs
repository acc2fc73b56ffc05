//! Event types - the keys listeners dispatch on.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EventError, Result};

/// Event types are case-insensitive and always held in uppercase.
///
/// The effect lifecycle types are closed variants; anything else a game
/// publishes lands in `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    /// An effect was accepted into a handler.
    Applied,

    /// A live effect was replaced or gained stacks.
    Refreshed,

    /// An effect left its handler.
    Removed,

    /// User-defined type, uppercase and non-empty.
    Custom(String),
}

impl EventType {
    /// Parse an event type, normalizing to uppercase.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "" => Err(EventError::EmptyEventType),
            "APPLIED" => Ok(EventType::Applied),
            "REFRESHED" => Ok(EventType::Refreshed),
            "REMOVED" => Ok(EventType::Removed),
            _ => Ok(EventType::Custom(normalized)),
        }
    }

    /// Uppercase string form.
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Applied => "APPLIED",
            EventType::Refreshed => "REFRESHED",
            EventType::Removed => "REMOVED",
            EventType::Custom(s) => s,
        }
    }

    /// Whether this is one of the effect lifecycle types.
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, EventType::Custom(_))
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
