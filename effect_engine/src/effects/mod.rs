//! Effects module - buffs, debuffs and status conditions.
//!
//! - **EffectDefinition**: the data loaded from the definition source
//! - **Effect**: a live instance with a bound commit action and a listener
//!   for its own lifecycle events

mod definition;
mod effect;

pub use definition::*;
pub use effect::*;
