//! Events - immutable `(type, data)` notifications.

mod event;
mod event_type;

pub use event::*;
pub use event_type::*;
