//! Batching delivery queue.
//!
//! The queue runs a background loop that wakes up every `batch_delay`, reads up to
//! `batch_size` events from the front of its store and hands them to the transport.
//! Events leave the store only once the transport accepted them, so a rejected batch
//! is retried as a whole on the next tick (at-least-once delivery).

use super::store::{MemoryQueueStore, TrackerQueueStore};
use crate::error::{Result, TrackerError};
use crate::event::TrackerEvent;
use crate::transport::TrackerTransport;
use crate::waiting::{wait_until, DEFAULT_POLL_INTERVAL};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TrackerQueueConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Default for TrackerQueueConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            batch_delay: Duration::from_millis(1000),
        }
    }
}

/// Result of a single drain cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was in flight.
    Skipped,
    /// The transport was not usable, nothing was read.
    TransportUnusable,
    Empty,
    /// The batch was accepted and removed from the store.
    Delivered(usize),
    /// The transport rejected the batch, which stays in the store.
    Rejected(String),
}

struct QueueState {
    store: Arc<dyn TrackerQueueStore>,
    config: TrackerQueueConfig,
    processing: AtomicBool,
    stop_flag: AtomicBool,
    transport: RwLock<Option<Arc<dyn TrackerTransport>>>,
}

/// Clears the processing flag when the drain ends, however it ends.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl QueueState {
    fn transport(&self) -> Option<Arc<dyn TrackerTransport>> {
        self.transport
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn drain(&self) -> Result<DrainOutcome> {
        if self.processing.swap(true, Ordering::SeqCst) {
            debug!("Drain already in progress, skipping");
            return Ok(DrainOutcome::Skipped);
        }
        let _guard = ProcessingGuard(&self.processing);

        let transport = self.transport().ok_or_else(|| {
            TrackerError::QueueError("No transport configured for the queue".to_string())
        })?;

        if !transport.is_usable() {
            debug!("{} is not usable, leaving events queued", transport.transport_name());
            return Ok(DrainOutcome::TransportUnusable);
        }

        let batch = self.store.read(self.config.batch_size, 0).await?;
        if batch.is_empty() {
            return Ok(DrainOutcome::Empty);
        }

        let ids: Vec<String> = batch.iter().map(|e| e.id().to_string()).collect();
        debug!("Draining {} events to {}", ids.len(), transport.transport_name());

        match transport.handle(batch).await {
            Ok(()) => {
                self.store.delete(&ids).await?;
                Ok(DrainOutcome::Delivered(ids.len()))
            }
            Err(e) => {
                warn!("Batch of {} events rejected, keeping it queued: {}", ids.len(), e);
                Ok(DrainOutcome::Rejected(e.to_string()))
            }
        }
    }

    async fn is_empty(&self) -> bool {
        !self.processing.load(Ordering::SeqCst)
            && matches!(self.store.length().await, Ok(0))
    }
}

/// Buffers events in a [`TrackerQueueStore`] and delivers them in batches.
///
/// # Examples
///
/// ```ignore
/// let queue = Arc::new(TrackerQueue::new(TrackerQueueConfig::default()));
/// queue.run(transport)?;
/// queue.push(vec![event]).await?;
/// queue.wait_until_empty(Duration::from_secs(5)).await;
/// ```
pub struct TrackerQueue {
    state: Arc<QueueState>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl TrackerQueue {
    /// Create a queue backed by an in-memory store.
    ///
    /// # Arguments
    ///
    /// * `config` - Batch size and delay between two drains
    pub fn new(config: TrackerQueueConfig) -> Self {
        Self::with_store(Arc::new(MemoryQueueStore::new()), config)
    }

    /// Create a queue backed by `store`, e.g. a [`super::FileQueueStore`] so queued
    /// events survive a restart.
    ///
    /// # Arguments
    ///
    /// * `store` - Where queued events are kept until delivered
    /// * `config` - Batch size and delay between two drains
    pub fn with_store(store: Arc<dyn TrackerQueueStore>, config: TrackerQueueConfig) -> Self {
        Self {
            state: Arc::new(QueueState {
                store,
                config,
                processing: AtomicBool::new(false),
                stop_flag: AtomicBool::new(false),
                transport: RwLock::new(None),
            }),
            task_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TrackerQueueConfig {
        &self.state.config
    }

    pub fn store(&self) -> &Arc<dyn TrackerQueueStore> {
        &self.state.store
    }

    /// Sets the transport the queue drains into, without starting the loop.
    pub fn set_transport(&self, transport: Arc<dyn TrackerTransport>) {
        *self
            .state
            .transport
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(transport);
    }

    pub fn has_transport(&self) -> bool {
        self.state.transport().is_some()
    }

    pub async fn push(&self, events: Vec<TrackerEvent>) -> Result<()> {
        debug!("Queueing {} events", events.len());
        self.state.store.write(events).await
    }

    /// Starts the background loop, draining into `transport`.
    ///
    /// Must be called from within a tokio runtime. Starting a running queue is an error.
    pub fn run(&self, transport: Arc<dyn TrackerTransport>) -> Result<()> {
        let mut task_handle = self.lock_task_handle();
        if task_handle.is_some() {
            return Err(TrackerError::QueueError("Queue already running".to_string()));
        }

        self.set_transport(transport);
        self.spawn_loop(&mut task_handle)
    }

    /// Starts the loop with the already configured transport, unless it is running.
    pub fn ensure_running(&self) -> Result<()> {
        let mut task_handle = self.lock_task_handle();
        if task_handle.is_some() {
            return Ok(());
        }
        if !self.has_transport() {
            return Err(TrackerError::QueueError(
                "No transport configured for the queue".to_string(),
            ));
        }

        self.spawn_loop(&mut task_handle)
    }

    fn spawn_loop(&self, task_handle: &mut Option<JoinHandle<()>>) -> Result<()> {
        let runtime = Handle::try_current().map_err(|e| {
            TrackerError::QueueError(format!("Queue needs a tokio runtime to run: {}", e))
        })?;

        self.state.stop_flag.store(false, Ordering::SeqCst);

        let state = self.state.clone();
        *task_handle = Some(runtime.spawn(async move {
            Self::run_loop(state).await;
        }));
        info!("Tracker queue started");

        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.lock_task_handle().is_some()
    }

    /// Stops the background loop. Queued events stay in the store.
    pub async fn stop(&self) -> Result<()> {
        let handle = self.lock_task_handle().take();
        if let Some(handle) = handle {
            debug!("Stopping tracker queue");
            self.state.stop_flag.store(true, Ordering::SeqCst);
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    return Err(TrackerError::QueueError(format!("Failed to stop queue: {}", e)));
                }
            }
            info!("Tracker queue stopped");
        }
        Ok(())
    }

    /// Runs a single drain cycle.
    pub async fn drain(&self) -> Result<DrainOutcome> {
        self.state.drain().await
    }

    /// Drains until the store is empty, regardless of the timer.
    ///
    /// Returns the number of delivered events. A rejected batch aborts the flush with
    /// the transport error; the batch stays queued.
    pub async fn flush(&self) -> Result<usize> {
        let mut delivered = 0;
        loop {
            match self.state.drain().await? {
                DrainOutcome::Delivered(count) => delivered += count,
                DrainOutcome::Empty => return Ok(delivered),
                DrainOutcome::Skipped => tokio::time::sleep(DEFAULT_POLL_INTERVAL).await,
                DrainOutcome::TransportUnusable => {
                    return Err(TrackerError::TransportUnusable(
                        "Queue transport is not usable".to_string(),
                    ));
                }
                DrainOutcome::Rejected(reason) => {
                    return Err(TrackerError::TransportError(reason));
                }
            }
        }
    }

    pub async fn len(&self) -> Result<usize> {
        self.state.store.length().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// No drain in flight and nothing left in the store.
    pub async fn is_idle(&self) -> bool {
        self.state.is_empty().await
    }

    /// Waits until the queue is idle. Returns `false` on timeout.
    pub async fn wait_until_empty(&self, timeout: Duration) -> bool {
        let state = self.state.clone();
        wait_until(
            move || {
                let state = state.clone();
                async move { state.is_empty().await }
            },
            DEFAULT_POLL_INTERVAL,
            timeout,
        )
        .await
    }

    fn lock_task_handle(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task_handle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run_loop(state: Arc<QueueState>) {
        // The first batch goes out one `batch_delay` after the loop starts.
        let period = state.config.batch_delay;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !state.stop_flag.load(Ordering::SeqCst) {
            ticker.tick().await;
            if state.stop_flag.load(Ordering::SeqCst) {
                break;
            }

            match state.drain().await {
                Ok(DrainOutcome::Delivered(count)) => debug!("Delivered {} queued events", count),
                Ok(_) => {}
                Err(e) => warn!("Queue drain failed: {}", e),
            }
        }

        debug!("Queue loop exiting");
    }
}

impl std::fmt::Debug for TrackerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerQueue")
            .field("store", &self.state.store.store_name())
            .field("config", &self.state.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for TrackerQueue {
    fn drop(&mut self) {
        self.state.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.lock_task_handle().take() {
            handle.abort();
        }
    }
}
