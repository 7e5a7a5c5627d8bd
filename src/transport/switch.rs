use super::TrackerTransport;
use crate::console::{default_console, TrackerConsole};
use crate::error::{Result, TrackerError};
use crate::event::TrackerEvent;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

pub const TRANSPORT_SWITCH: &str = "TransportSwitch";

pub type EventMatcher = Arc<dyn Fn(&TrackerEvent) -> bool + Send + Sync>;

struct Route {
    matcher: EventMatcher,
    transport: Arc<dyn TrackerTransport>,
}

/// Routes each event to the first route that accepts it and whose transport is usable.
///
/// Unlike [`TransportGroup`](super::TransportGroup), a single batch may be split across
/// several transports. Events no route accepts are dropped with a warning.
pub struct TransportSwitch {
    routes: Vec<Route>,
    console: Arc<dyn TrackerConsole>,
}

impl TransportSwitch {
    pub fn new(console: Option<Arc<dyn TrackerConsole>>) -> Self {
        Self {
            routes: Vec::new(),
            console: console.unwrap_or_else(default_console),
        }
    }

    pub fn route<F>(mut self, matcher: F, transport: Arc<dyn TrackerTransport>) -> Self
    where
        F: Fn(&TrackerEvent) -> bool + Send + Sync + 'static,
    {
        self.routes.push(Route {
            matcher: Arc::new(matcher),
            transport,
        });
        self
    }

    /// A route accepting every event; add it last.
    pub fn fallback(self, transport: Arc<dyn TrackerTransport>) -> Self {
        self.route(|_| true, transport)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn route_index(&self, event: &TrackerEvent) -> Option<usize> {
        self.routes
            .iter()
            .position(|route| route.transport.is_usable() && (route.matcher)(event))
    }
}

#[async_trait]
impl TrackerTransport for TransportSwitch {
    fn transport_name(&self) -> &str {
        TRANSPORT_SWITCH
    }

    fn is_usable(&self) -> bool {
        self.routes.iter().any(|route| route.transport.is_usable())
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        if !self.is_usable() {
            return Err(TrackerError::TransportUnusable(format!(
                "{} has no usable route",
                TRANSPORT_SWITCH
            )));
        }

        let mut buckets: Vec<Vec<TrackerEvent>> = vec![Vec::new(); self.routes.len()];
        for event in events {
            match self.route_index(&event) {
                Some(index) => buckets[index].push(event),
                None => self.console.warn(&format!(
                    "{}: no route for {} ({}), dropping it.",
                    TRANSPORT_SWITCH,
                    event.event_type(),
                    event.id()
                )),
            }
        }

        let deliveries = self
            .routes
            .iter()
            .zip(buckets)
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(route, bucket)| {
                debug!(
                    "{} routing {} events to {}",
                    TRANSPORT_SWITCH,
                    bucket.len(),
                    route.transport.transport_name()
                );
                route.transport.handle(bucket)
            });

        join_all(deliveries).await.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleLevel, MemoryConsole};
    use crate::event::UntrackedEvent;
    use crate::transport::testing::RecordingTransport;

    fn event(event_type: &str, id: &str) -> TrackerEvent {
        TrackerEvent::with_identity(UntrackedEvent::new(event_type), id, 0)
    }

    #[tokio::test]
    async fn test_each_event_routed_independently() {
        let failures = Arc::new(RecordingTransport::new("failures"));
        let everything = Arc::new(RecordingTransport::new("everything"));
        let switch = TransportSwitch::new(None)
            .route(|e| e.event_type() == "FailureEvent", failures.clone())
            .fallback(everything.clone());

        switch
            .handle(vec![
                event("PressEvent", "1"),
                event("FailureEvent", "2"),
                event("VisibleEvent", "3"),
            ])
            .await
            .unwrap();

        assert_eq!(failures.delivered_ids(), vec!["2".to_string()]);
        assert_eq!(everything.delivered_ids(), vec!["1".to_string(), "3".to_string()]);
    }

    #[tokio::test]
    async fn test_unusable_route_is_passed_over() {
        let offline = Arc::new(RecordingTransport::new("offline").unusable());
        let fallback = Arc::new(RecordingTransport::new("fallback"));
        let switch = TransportSwitch::new(None)
            .route(|_| true, offline.clone())
            .fallback(fallback.clone());

        switch.handle(vec![event("PressEvent", "1")]).await.unwrap();

        assert_eq!(offline.calls(), 0);
        assert_eq!(fallback.delivered_ids(), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_unrouted_events_are_dropped_with_warning() {
        let console = MemoryConsole::new();
        let failures = Arc::new(RecordingTransport::new("failures"));
        let switch = TransportSwitch::new(Some(Arc::new(console.clone())))
            .route(|e| e.event_type() == "FailureEvent", failures.clone());

        switch.handle(vec![event("PressEvent", "1")]).await.unwrap();

        assert_eq!(failures.calls(), 0);
        assert_eq!(console.count_containing(ConsoleLevel::Warn, "no route for PressEvent"), 1);
    }

    #[tokio::test]
    async fn test_any_route_rejection_rejects() {
        let failing = Arc::new(RecordingTransport::new("failing").failing(1));
        let fine = Arc::new(RecordingTransport::new("fine"));
        let switch = TransportSwitch::new(None)
            .route(|e| e.event_type() == "FailureEvent", failing.clone())
            .fallback(fine.clone());

        let result = switch
            .handle(vec![event("PressEvent", "1"), event("FailureEvent", "2")])
            .await;

        assert!(result.is_err());
        assert_eq!(fine.delivered_ids(), vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_usable_iff_any_route_usable() {
        let switch = TransportSwitch::new(None)
            .route(|_| true, Arc::new(RecordingTransport::new("a").unusable()));
        assert!(!switch.is_usable());
        assert!(switch.handle(vec![event("PressEvent", "1")]).await.is_err());

        let switch = switch.fallback(Arc::new(RecordingTransport::new("b")));
        assert!(switch.is_usable());
        assert_eq!(switch.len(), 2);
    }
}
