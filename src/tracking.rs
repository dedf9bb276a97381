//! Active-user tracking: role assignment and event fan-out.
//!
//! This module turns raw skeleton frames into a stable notion of "player one"
//! and "player two" and publishes the result to subscribers. The resolver owns
//! the assignment rules; the event hub owns delivery and edge-triggering.

mod events;
mod resolver;
mod slots;

pub use events::{EventHub, GatedListener, SensorListener, UserDataSink};
pub use resolver::ActiveUserResolver;
pub use slots::{ActiveSlot, ActiveSlots, UserCount};
