//! Registry of trackers keyed by tracker id.
//!
//! The repository is an explicit object rather than a process-wide singleton: hosts
//! keep one around (usually behind an `Arc`), tests build isolated ones. Configuration
//! mistakes such as duplicate ids are reported to the console, never returned as
//! errors; only looking up a tracker that doesn't exist fails.

use crate::console::{default_console, TrackerConsole};
use crate::error::{Result, TrackerError};
use crate::tracker::{Tracker, TrackerConfig};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Default)]
struct Registry {
    trackers: BTreeMap<String, Arc<Tracker>>,
    default_id: Option<String>,
}

pub struct TrackerRepository {
    registry: RwLock<Registry>,
    console: Arc<dyn TrackerConsole>,
}

impl TrackerRepository {
    pub fn new(console: Option<Arc<dyn TrackerConsole>>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            console: console.unwrap_or_else(default_console),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, registry: &mut Registry, tracker: Arc<Tracker>) -> Option<Arc<Tracker>> {
        let id = tracker.tracker_id().to_string();
        if registry.trackers.contains_key(&id) {
            self.console
                .error(&format!("TrackerRepository: a Tracker with id {} already exists.", id));
            return None;
        }

        if registry.default_id.is_none() {
            debug!("Tracker {} is now the default tracker", id);
            registry.default_id = Some(id.clone());
        }
        registry.trackers.insert(id.clone(), tracker.clone());
        info!("Tracker {} registered", id);

        Some(tracker)
    }

    /// Builds and registers a tracker. Returns `None`, after reporting, if the id is taken.
    ///
    /// The first registered tracker becomes the default one.
    pub fn make(&self, config: TrackerConfig) -> Option<Arc<Tracker>> {
        let mut registry = self.write();
        if registry.trackers.contains_key(config.tracker_id()) {
            self.console.error(&format!(
                "TrackerRepository: a Tracker with id {} already exists.",
                config.tracker_id()
            ));
            return None;
        }
        self.insert(&mut registry, Arc::new(Tracker::new(config)))
    }

    /// Registers an already built tracker, e.g. one derived with [`Tracker::from_tracker`].
    pub fn add(&self, tracker: Arc<Tracker>) -> Option<Arc<Tracker>> {
        let mut registry = self.write();
        self.insert(&mut registry, tracker)
    }

    /// The tracker called `id`, or the default tracker when `id` is `None`.
    pub fn get(&self, id: Option<&str>) -> Result<Arc<Tracker>> {
        let registry = self.read();

        let id = match id {
            Some(id) => id,
            None => registry.default_id.as_deref().ok_or_else(|| {
                TrackerError::TrackerNotFound("no default tracker is set".to_string())
            })?,
        };

        registry
            .trackers
            .get(id)
            .cloned()
            .ok_or_else(|| TrackerError::TrackerNotFound(id.to_string()))
    }

    /// The tracker matching `config`'s id, built and registered if missing.
    ///
    /// An existing tracker built from a different configuration is returned as is, and
    /// the mismatch is reported.
    pub fn get_or_make(&self, config: TrackerConfig) -> Arc<Tracker> {
        let mut registry = self.write();

        if let Some(existing) = registry.trackers.get(config.tracker_id()) {
            if !config.matches(existing) {
                self.console.warn(&format!(
                    "TrackerRepository: Tracker {} already exists with a different configuration.",
                    config.tracker_id()
                ));
            }
            return existing.clone();
        }

        let tracker = Arc::new(Tracker::new(config));
        self.insert(&mut registry, tracker.clone());
        tracker
    }

    /// Points the default at `id`. Unknown ids are reported and leave the default as is.
    pub fn set_default(&self, id: &str) -> bool {
        let mut registry = self.write();
        if !registry.trackers.contains_key(id) {
            self.console.error(&format!(
                "TrackerRepository: cannot set {} as default, no such Tracker.",
                id
            ));
            return false;
        }
        registry.default_id = Some(id.to_string());
        true
    }

    /// Makes the tracker described by `config` the default, building it if needed.
    pub fn set_default_config(&self, config: TrackerConfig) -> Arc<Tracker> {
        let tracker = self.get_or_make(config);
        self.write().default_id = Some(tracker.tracker_id().to_string());
        tracker
    }

    pub fn default_id(&self) -> Option<String> {
        self.read().default_id.clone()
    }

    /// Removes the tracker called `id`. Removing the default tracker unsets the default.
    pub fn delete(&self, id: &str) -> bool {
        let mut registry = self.write();
        if registry.trackers.remove(id).is_none() {
            self.console
                .error(&format!("TrackerRepository: cannot delete {}, no such Tracker.", id));
            return false;
        }
        if registry.default_id.as_deref() == Some(id) {
            registry.default_id = None;
        }
        true
    }

    pub fn clear(&self) {
        let mut registry = self.write();
        registry.trackers.clear();
        registry.default_id = None;
    }

    pub fn ids(&self) -> Vec<String> {
        self.read().trackers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().trackers.is_empty()
    }

    fn trackers(&self) -> Vec<Arc<Tracker>> {
        self.read().trackers.values().cloned().collect()
    }

    pub fn activate_all(&self) {
        self.trackers().iter().for_each(|t| t.set_active(true));
    }

    pub fn deactivate_all(&self) {
        self.trackers().iter().for_each(|t| t.set_active(false));
    }

    /// Flushes the queue of every tracker. Returns the number of delivered events.
    pub async fn flush_queues(&self) -> Result<usize> {
        let trackers = self.trackers();
        let results = join_all(trackers.iter().map(|t| t.flush_queue())).await;

        let mut delivered = 0;
        for result in results {
            delivered += result?;
        }
        Ok(delivered)
    }

    /// Waits until every tracker's queue is drained. Returns `false` on timeout.
    pub async fn wait_for_queues(&self, timeout: Duration) -> bool {
        let trackers = self.trackers();
        let results = join_all(trackers.iter().map(|t| t.wait_for_queue(timeout))).await;

        results.into_iter().all(|drained| drained)
    }
}

impl Default for TrackerRepository {
    fn default() -> Self {
        Self::new(None)
    }
}
