//! Scriptable transport shared by the transport, queue and tracker tests.

use super::TrackerTransport;
use crate::error::{Result, TrackerError};
use crate::event::TrackerEvent;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) struct RecordingTransport {
    name: String,
    usable: AtomicBool,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl RecordingTransport {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            usable: AtomicBool::new(true),
            failures_left: AtomicUsize::new(0),
            delay: None,
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Rejects the first `count` calls.
    pub(crate) fn failing(mut self, count: usize) -> Self {
        self.failures_left = AtomicUsize::new(count);
        self
    }

    pub(crate) fn unusable(self) -> Self {
        self.usable.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn set_usable(&self, usable: bool) {
        self.usable.store(usable, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Ids of every batch that was accepted, in order.
    pub(crate) fn delivered(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub(crate) fn delivered_ids(&self) -> Vec<String> {
        self.delivered().into_iter().flatten().collect()
    }
}

#[async_trait]
impl TrackerTransport for RecordingTransport {
    fn transport_name(&self) -> &str {
        &self.name
    }

    fn is_usable(&self) -> bool {
        self.usable.load(Ordering::SeqCst)
    }

    async fn handle(&self, events: Vec<TrackerEvent>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if fail {
            return Err(TrackerError::TransportError(format!("{} rejected the batch", self.name)));
        }

        let ids = events.iter().map(|e| e.id().to_string()).collect();
        self.batches.lock().unwrap().push(ids);
        Ok(())
    }
}
