//! Event queue: stores and the batching delivery loop.

pub mod file_store;
pub mod store;
pub mod tracker_queue;

pub use file_store::FileQueueStore;
pub use store::{MemoryQueueStore, TrackerQueueStore};
pub use tracker_queue::{DrainOutcome, TrackerQueue, TrackerQueueConfig};
