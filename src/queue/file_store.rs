//! File-backed queue store.
//!
//! Keeps the queue in memory and rewrites a JSON file after every mutation, so events
//! that were not delivered before the process exited are picked up by the next run.

use super::store::{read_window, remove_ids, TrackerQueueStore};
use crate::error::{Result, TrackerError};
use crate::event::TrackerEvent;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
pub struct FileQueueStore {
    path: PathBuf,
    events: Mutex<Vec<TrackerEvent>>,
}

impl FileQueueStore {
    /// Opens the store at `path`, loading any events persisted by a previous run.
    ///
    /// A missing file is an empty queue; a file that isn't a JSON array of events is a
    /// `QueueError`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let events = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                TrackerError::QueueError(format!("Corrupt queue file {:?}: {}", path, e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Opened queue file {:?} with {} pending events", path, events.len());

        Ok(Self {
            path,
            events: Mutex::new(events),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, events: &[TrackerEvent]) -> Result<()> {
        let raw = serde_json::to_vec(events)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl TrackerQueueStore for FileQueueStore {
    fn store_name(&self) -> &str {
        "FileQueueStore"
    }

    async fn read(&self, count: usize, position: usize) -> Result<Vec<TrackerEvent>> {
        let events = self.events.lock().await;
        Ok(read_window(&events, count, position))
    }

    async fn write(&self, new_events: Vec<TrackerEvent>) -> Result<()> {
        let mut events = self.events.lock().await;
        events.extend(new_events);
        self.persist(&events).await
    }

    async fn delete(&self, ids: &[String]) -> Result<()> {
        let mut events = self.events.lock().await;
        remove_ids(&mut events, ids);
        self.persist(&events).await
    }

    async fn length(&self) -> Result<usize> {
        Ok(self.events.lock().await.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut events = self.events.lock().await;
        events.clear();
        self.persist(&events).await
    }
}
