use crate::event::TrackerEvent;
use crate::Result;
use async_trait::async_trait;

/// Delivers finalized events to a collector.
///
/// Transports compose: a [`RetryTransport`](super::RetryTransport) can wrap a
/// [`TransportGroup`](super::TransportGroup), a group can contain retries, and so on.
#[async_trait]
pub trait TrackerTransport: Send + Sync {
    fn transport_name(&self) -> &str;

    /// Whether the prerequisites of this transport are met right now.
    fn is_usable(&self) -> bool {
        true
    }

    /// Sends a batch of events. A rejection means none of the batch should be
    /// considered delivered.
    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()>;
}
