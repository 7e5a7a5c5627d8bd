//! Event delivery.
//!
//! Every transport implements [`TrackerTransport`]. Transports compose recursively:
//!
//! - [`HttpTransport`] - POSTs batches to a collector
//! - [`DebugTransport`] - writes events to the diagnostic sink
//! - [`TransportGroup`] - first usable member wins
//! - [`TransportSwitch`] - per-event routing
//! - [`RetryTransport`] - retries with backoff
//! - [`QueuedTransport`] - buffers through a [`TrackerQueue`](crate::queue::TrackerQueue)

pub mod debug;
pub mod group;
pub mod http;
pub mod queued;
pub mod retry;
pub mod switch;
#[allow(clippy::module_inception)]
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use debug::DebugTransport;
pub use group::TransportGroup;
pub use http::{HttpTransport, HttpTransportConfig};
pub use queued::QueuedTransport;
pub use retry::{
    RetryCancellation, RetryDecision, RetryPolicy, RetryScheduler, RetryState, RetryTransport,
    TokioScheduler,
};
pub use switch::{EventMatcher, TransportSwitch};
pub use transport::TrackerTransport;
