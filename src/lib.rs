//! Client-side event tracking.
//!
//! Events are composed with hierarchical context metadata (where in the application
//! they happened, which ambient facts apply), run through an ordered plugin pipeline
//! and handed to a composable transport, optionally through a batching queue.
//!
//! # Modules
//!
//! - [`context`] - contexts, merge rules, equality and the location tree
//! - [`event`] - untracked and finalized events
//! - [`plugins`] - the plugin pipeline and built-in plugins
//! - [`transport`] - HTTP, debug, group, switch, retry and queued transports
//! - [`queue`] - queue stores and the batching delivery loop
//! - [`tracker`] - the orchestrator
//! - [`repository`] - registry of trackers
//! - [`console`] - the diagnostic sink

pub mod console;
pub mod context;
pub mod error;
pub mod event;
mod handoff;
pub mod plugins;
pub mod queue;
pub mod repository;
pub mod tracker;
pub mod transport;
pub mod waiting;

pub use error::{Result, TrackerError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::console::{TrackerConsole, TracingConsole};
    pub use crate::context::{ContextsConfig, GlobalContext, LocationContext};
    pub use crate::error::{Result, TrackerError};
    pub use crate::event::{TrackerEvent, UntrackedEvent};
    pub use crate::plugins::{TrackerPlugin, TrackerPlugins};
    pub use crate::queue::{TrackerQueue, TrackerQueueConfig};
    pub use crate::repository::TrackerRepository;
    pub use crate::tracker::{Tracker, TrackerConfig};
    pub use crate::transport::{HttpTransport, RetryTransport, TrackerTransport, TransportGroup};
}
