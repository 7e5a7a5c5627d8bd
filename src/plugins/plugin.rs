//! The plugin trait.
//!
//! Every lifecycle hook has a no-op default, so a plugin only implements the hooks it
//! cares about. The pipeline never has to ask whether a plugin "has" a hook.

use crate::context::ContextsConfig;
use crate::event::{TrackerEvent, UntrackedEvent};
use crate::tracker::Tracker;

/// A unit of behavior plugged into a tracker's event pipeline.
///
/// # Examples
///
/// ```
/// use tracker_core::context::{ContextsConfig, GlobalContext};
/// use tracker_core::plugins::TrackerPlugin;
///
/// struct DeviceContextPlugin;
///
/// impl TrackerPlugin for DeviceContextPlugin {
///     fn plugin_name(&self) -> &str {
///         "DeviceContextPlugin"
///     }
///
///     fn enrich(&self, contexts: &mut ContextsConfig) {
///         contexts.global_contexts.push(GlobalContext::new("DeviceContext", "desktop"));
///     }
/// }
/// ```
pub trait TrackerPlugin: Send + Sync {
    /// Unique name of the plugin within a pipeline
    fn plugin_name(&self) -> &str;

    /// Unusable plugins are skipped by every hook.
    fn is_usable(&self) -> bool {
        true
    }

    /// Called once when the owning tracker is constructed.
    fn initialize(&self, _tracker: &Tracker) {}

    /// Inspects the composed event before enrichment. Must not block delivery.
    fn validate(&self, _event: &UntrackedEvent) {}

    /// Adds contexts to the in-progress event.
    fn enrich(&self, _contexts: &mut ContextsConfig) {}

    /// Observes the finalized event right before it is handed to the transport.
    fn before_transport(&self, _event: &TrackerEvent) {}
}
