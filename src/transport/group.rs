use super::TrackerTransport;
use crate::error::{Result, TrackerError};
use crate::event::TrackerEvent;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const TRANSPORT_GROUP: &str = "TransportGroup";

/// Fallback chain: the whole batch goes to the first member usable at call time.
pub struct TransportGroup {
    transports: Vec<Arc<dyn TrackerTransport>>,
}

impl TransportGroup {
    /// Members in priority order.
    pub fn new(transports: Vec<Arc<dyn TrackerTransport>>) -> Self {
        Self { transports }
    }

    pub fn transports(&self) -> &[Arc<dyn TrackerTransport>] {
        &self.transports
    }

    /// The member that would receive a batch right now.
    pub fn first_usable(&self) -> Option<&Arc<dyn TrackerTransport>> {
        self.transports.iter().find(|t| t.is_usable())
    }
}

#[async_trait]
impl TrackerTransport for TransportGroup {
    fn transport_name(&self) -> &str {
        TRANSPORT_GROUP
    }

    fn is_usable(&self) -> bool {
        self.first_usable().is_some()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        let transport = self.first_usable().ok_or_else(|| {
            TrackerError::TransportUnusable(format!(
                "None of the {} transports in the group is usable",
                self.transports.len()
            ))
        })?;

        debug!("{} delegating to {}", TRANSPORT_GROUP, transport.transport_name());
        transport.handle(events).await
    }
}
