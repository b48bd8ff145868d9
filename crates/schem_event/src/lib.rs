//! # schem_event - Command Queue and Observers
//!
//! Signal delivery between producers and the simulation thread:
//! - [`CommandQueue`]: FIFO guarded by a single mutex, optionally bounded
//! - [`QueueSender`]: cloneable producer handle for other threads
//! - [`ObserverList`]: synchronous notification of subscribers

pub mod observer;
pub mod queue;

pub use observer::{ObserverList, SubscriberId};
pub use queue::{CommandQueue, OverflowPolicy, QueueConfig, QueueError, QueueSender};

/// Prelude
pub mod prelude {
    pub use crate::observer::{ObserverList, SubscriberId};
    pub use crate::queue::{CommandQueue, OverflowPolicy, QueueConfig, QueueError, QueueSender};
}
