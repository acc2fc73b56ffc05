//! # Effect Engine
//!
//! Lifecycle management for buffs, debuffs and status conditions, built on
//! the `event_bus` pub/sub layer.
//!
//! ## Core Components
//!
//! - **effects**: Effect definitions and live effect instances
//! - **handler**: Per-entity effect store with unique/refresh/stack rules
//! - **repository**: Effect catalog loaded from JSON, plus the factory that
//!   builds effects from it
//! - **config**: Engine settings loaded from TOML
//!
//! Every change to a handler's store emits an `APPLIED`, `REFRESHED` or
//! `REMOVED` event to the affected effect and through the handler's topic.

pub mod config;
pub mod effects;
pub mod error;
pub mod handler;
pub mod repository;

pub use config::EngineConfig;
pub use effects::*;
pub use error::EffectError;
pub use handler::*;
pub use repository::*;
