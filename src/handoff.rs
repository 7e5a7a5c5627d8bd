//! Ordered background hand-off of finalized events to a transport.
//!
//! Fire-and-forget tracking must not block the caller, yet events have to reach the
//! transport in the order they were tracked. Every tracker (and the trackers derived
//! from it) owns one [`Handoff`]: events are sent down an unbounded channel and a
//! single task forwards them, in order, to the transport.
//!
//! The number of events handed off but not yet accepted or rejected by the transport
//! is tracked, so "wait until delivered" operations can account for events that have
//! not reached a queue yet.

use crate::event::TrackerEvent;
use crate::transport::TrackerTransport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Pending {
    count: AtomicUsize,
    settled: Notify,
}

impl Pending {
    fn add(&self, count: usize) {
        self.count.fetch_add(count, Ordering::SeqCst);
    }

    fn done(&self, count: usize) {
        if self.count.fetch_sub(count, Ordering::SeqCst) == count {
            self.settled.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

pub(crate) struct Handoff {
    transport: Arc<dyn TrackerTransport>,
    sender: Mutex<Option<mpsc::UnboundedSender<TrackerEvent>>>,
    pending: Arc<Pending>,
}

impl Handoff {
    /// # Arguments
    ///
    /// * `transport` - The transport every handed off event is delivered to
    pub(crate) fn new(transport: Arc<dyn TrackerTransport>) -> Self {
        Self {
            transport,
            sender: Mutex::new(None),
            pending: Arc::new(Pending::default()),
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn TrackerTransport> {
        &self.transport
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<TrackerEvent>>> {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queues `event` for delivery behind every event handed off before it.
    ///
    /// The forwarding task is started on the current tokio runtime the first time it is
    /// needed, and again if the runtime it ran on has gone away. Without a runtime the
    /// event is given back.
    pub(crate) fn send(&self, event: TrackerEvent) -> Result<(), TrackerEvent> {
        let mut sender = self.lock_sender();

        if sender.as_ref().map_or(true, |s| s.is_closed()) {
            let Ok(runtime) = Handle::try_current() else {
                return Err(event);
            };

            let (tx, rx) = mpsc::unbounded_channel();
            runtime.spawn(forward(self.transport.clone(), rx, self.pending.clone()));
            debug!("Hand-off to {} started", self.transport.transport_name());
            *sender = Some(tx);
        }

        let Some(tx) = sender.as_ref() else {
            return Err(event);
        };

        // Counted before sending so the forwarding task can never decrement first.
        self.pending.add(1);
        tx.send(event).map_err(|mpsc::error::SendError(event)| {
            self.pending.done(1);
            event
        })
    }

    /// Events handed off but not yet through the transport.
    pub(crate) fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Resolves once every event handed off so far went through the transport.
    pub(crate) async fn settled(&self) {
        loop {
            let notified = self.pending.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.pending.get() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Like [`Handoff::settled`], giving up after `timeout`. Returns `false` on timeout.
    pub(crate) async fn settled_within(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.settled()).await.is_ok()
    }
}

/// Forwards events in arrival order. Events already waiting in the channel are
/// delivered together as one batch.
async fn forward(
    transport: Arc<dyn TrackerTransport>,
    mut receiver: mpsc::UnboundedReceiver<TrackerEvent>,
    pending: Arc<Pending>,
) {
    while let Some(event) = receiver.recv().await {
        let mut batch = vec![event];
        while let Ok(next) = receiver.try_recv() {
            batch.push(next);
        }

        let count = batch.len();
        if let Err(e) = transport.handle(batch).await {
            warn!(
                "Delivery of {} events through {} failed: {}",
                count,
                transport.transport_name(),
                e
            );
        }
        pending.done(count);
    }

    debug!("Hand-off to {} closed", transport.transport_name());
}
