//! In-process backends for the store and both channels.
//!
//! Nothing here touches disk or the network. Used by the engine tests and
//! for dry runs against hand-built series.

mod notifier;
mod store;
mod triggers;

pub use notifier::MemoryNotifier;
pub use store::MemoryStore;
pub use triggers::{MemoryTriggerLog, MemoryTriggerSource};
