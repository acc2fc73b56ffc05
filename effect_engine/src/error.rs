//! Error types for the effect engine.

use event_bus::EventError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EffectError>;

/// Errors raised while loading, registering, building or executing effects.
///
/// Everything except `CommitNotBound` is a configuration error and should
/// abort the offending load or registration.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("duplicate effect name in definitions: {0}")]
    DuplicateEffect(String),

    #[error("unique effect type declared twice: {0}")]
    DuplicateUniqueType(String),

    #[error("required key not found in metadata of {effect}: '{key}'")]
    MissingMetadata { effect: String, key: &'static str },

    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    #[error("unable to redefine commit for effect: {0}")]
    CommitAlreadyBound(String),

    #[error("unable to redefine {event_type} handler for effect: {effect}")]
    EventHandlerAlreadyBound { effect: String, event_type: String },

    /// Executing an effect that never had a commit bound.
    #[error("effect has no commit bound: {0}")]
    CommitNotBound(String),

    #[error("invalid event type: {0}")]
    InvalidEventType(#[from] EventError),

    #[error("failed to parse effect definitions: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to parse engine config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
