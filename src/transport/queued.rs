use super::TrackerTransport;
use crate::event::TrackerEvent;
use crate::queue::TrackerQueue;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub const QUEUED_TRANSPORT: &str = "QueuedTransport";

/// Hands events to a [`TrackerQueue`], which delivers them to `transport` in batches.
pub struct QueuedTransport {
    queue: Arc<TrackerQueue>,
    transport: Arc<dyn TrackerTransport>,
}

impl QueuedTransport {
    /// Wires `transport` as the queue's destination. The queue loop starts right away
    /// when a tokio runtime is available, otherwise on the first `handle`.
    pub fn new(queue: Arc<TrackerQueue>, transport: Arc<dyn TrackerTransport>) -> Self {
        queue.set_transport(transport.clone());
        if let Err(e) = queue.ensure_running() {
            debug!("Queue loop not started yet: {}", e);
        }
        Self { queue, transport }
    }

    pub fn queue(&self) -> &Arc<TrackerQueue> {
        &self.queue
    }

    pub fn transport(&self) -> &Arc<dyn TrackerTransport> {
        &self.transport
    }
}

#[async_trait]
impl TrackerTransport for QueuedTransport {
    fn transport_name(&self) -> &str {
        QUEUED_TRANSPORT
    }

    fn is_usable(&self) -> bool {
        self.transport.is_usable()
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        self.queue.push(events).await?;
        self.queue.ensure_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::UntrackedEvent;
    use crate::queue::TrackerQueueConfig;
    use crate::transport::testing::RecordingTransport;
    use std::time::Duration;

    fn queue() -> Arc<TrackerQueue> {
        Arc::new(TrackerQueue::new(TrackerQueueConfig {
            batch_size: 10,
            batch_delay: Duration::from_millis(10),
        }))
    }

    #[tokio::test]
    async fn test_events_flow_through_queue() {
        let inner = Arc::new(RecordingTransport::new("recording"));
        let queue = queue();
        let transport = QueuedTransport::new(queue.clone(), inner.clone());
        assert!(queue.is_running());

        transport
            .handle(vec![TrackerEvent::with_identity(UntrackedEvent::new("test-event"), "1", 0)])
            .await
            .unwrap();

        assert!(queue.wait_until_empty(Duration::from_secs(2)).await);
        assert_eq!(inner.delivered_ids(), vec!["1".to_string()]);

        queue.stop().await.unwrap();
    }

    #[test]
    fn test_construction_outside_runtime_defers_loop() {
        let inner = Arc::new(RecordingTransport::new("recording"));
        let queue = queue();
        let transport = QueuedTransport::new(queue.clone(), inner);

        assert!(!queue.is_running());
        assert!(queue.has_transport());
        assert!(transport.is_usable());
    }

    #[tokio::test]
    async fn test_usability_follows_inner_transport() {
        let inner = Arc::new(RecordingTransport::new("offline").unusable());
        let transport = QueuedTransport::new(queue(), inner.clone());
        assert!(!transport.is_usable());

        inner.set_usable(true);
        assert!(transport.is_usable());
    }
}
