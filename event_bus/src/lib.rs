//! # Event Bus
//!
//! Loosely coupled notification primitives for the game world. Any entity
//! can publish typed events or subscribe to them, directly or through named
//! topics. The effect engine builds its lifecycle events on this crate.
//!
//! ## Core Components
//!
//! - **events**: `Event` records and their case-insensitive `EventType`
//! - **pubsub**: `EventListener`, `EventPublisher` and `EventTopic`
//! - **stream**: `EventStream`, the registry of topics by name
//! - **entities**: identities of the entities that own listeners

pub mod entities;
pub mod error;
pub mod events;
pub mod pubsub;
pub mod stream;

pub use entities::*;
pub use error::EventError;
pub use events::*;
pub use pubsub::*;
pub use stream::*;
