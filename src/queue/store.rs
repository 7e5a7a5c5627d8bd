//! Queue stores.
//!
//! A store is an ordered buffer of finalized events waiting for delivery. The queue
//! reads batches from the front, and deletes them by id once the transport confirmed
//! delivery.

use crate::event::TrackerEvent;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::Mutex;

/// Ordered, pluggable buffer of not-yet-delivered events.
#[async_trait]
pub trait TrackerQueueStore: Send + Sync {
    /// Human readable name, used in logs
    fn store_name(&self) -> &str;

    /// Up to `count` events starting at `position`, in insertion order.
    async fn read(&self, count: usize, position: usize) -> Result<Vec<TrackerEvent>>;

    /// Appends events at the back of the store.
    async fn write(&self, events: Vec<TrackerEvent>) -> Result<()>;

    /// Removes every event whose id is in `ids`. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> Result<()>;

    async fn length(&self) -> Result<usize>;

    async fn clear(&self) -> Result<()>;
}

/// In-process store, the default.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    events: Mutex<Vec<TrackerEvent>>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn read_window(
    events: &[TrackerEvent],
    count: usize,
    position: usize,
) -> Vec<TrackerEvent> {
    events.iter().skip(position).take(count).cloned().collect()
}

pub(crate) fn remove_ids(events: &mut Vec<TrackerEvent>, ids: &[String]) {
    let doomed: HashSet<&str> = ids.iter().map(String::as_str).collect();
    events.retain(|event| !doomed.contains(event.id()));
}

#[async_trait]
impl TrackerQueueStore for MemoryQueueStore {
    fn store_name(&self) -> &str {
        "MemoryQueueStore"
    }

    async fn read(&self, count: usize, position: usize) -> Result<Vec<TrackerEvent>> {
        let events = self.events.lock().await;
        Ok(read_window(&events, count, position))
    }

    async fn write(&self, new_events: Vec<TrackerEvent>) -> Result<()> {
        let mut events = self.events.lock().await;
        events.extend(new_events);
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut events = self.events.lock().await;
        remove_ids(&mut events, ids);
        Ok(())
    }

    async fn length(&self) -> Result<usize> {
        Ok(self.events.lock().await.len())
    }

    async fn clear(&self) -> Result<()> {
        self.events.lock().await.clear();
        Ok(())
    }
}
