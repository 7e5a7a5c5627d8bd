//! Diagnostic sink for configuration and taxonomy problems.
//!
//! The tracker never fails a tracking call because of a misconfiguration or a taxonomy
//! violation. Instead it writes a human-readable diagnostic to a [`TrackerConsole`].
//!
//! - [`TracingConsole`]: default sink, forwards to the `tracing` macros
//! - [`NoopConsole`]: null object for silencing diagnostics entirely
//! - [`MemoryConsole`]: records every entry, handy for tests and bindings that
//!   want to surface diagnostics in their own UI

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

/// Console-like interface the core writes diagnostics to.
pub trait TrackerConsole: Send + Sync {
    fn log(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Opens a collapsed group; entries until the matching `group_end` belong to it.
    fn group_collapsed(&self, label: &str);

    fn group_end(&self);
}

/// Default sink, routing diagnostics to `tracing`.
///
/// Grouped entries are indented by their nesting depth.
#[derive(Debug, Default)]
pub struct TracingConsole {
    depth: AtomicUsize,
}

impl TracingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth.load(Ordering::SeqCst))
    }
}

impl TrackerConsole for TracingConsole {
    fn log(&self, message: &str) {
        info!("{}{}", self.indent(), message);
    }

    fn warn(&self, message: &str) {
        warn!("{}{}", self.indent(), message);
    }

    fn error(&self, message: &str) {
        error!("{}{}", self.indent(), message);
    }

    fn group_collapsed(&self, label: &str) {
        info!("{}{}", self.indent(), label);
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn group_end(&self) {
        let _ = self.depth.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1));
    }
}

/// A sink that silently discards everything, for production builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConsole;

impl NoopConsole {
    pub fn new() -> Self {
        Self
    }
}

impl TrackerConsole for NoopConsole {
    fn log(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn error(&self, _message: &str) {}

    fn group_collapsed(&self, _label: &str) {}

    fn group_end(&self) {}
}

/// Severity of a recorded console entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Warn,
    Error,
    Group,
    GroupEnd,
}

/// A single entry captured by [`MemoryConsole`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleEntry {
    pub level: ConsoleLevel,
    pub message: String,
}

/// Records every diagnostic in memory.
///
/// Clones share the same buffer, so a clone can be handed to a tracker while the
/// original is kept around for inspection.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    entries: Arc<Mutex<Vec<ConsoleEntry>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ConsoleEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, level: ConsoleLevel, message: &str) {
        self.lock().push(ConsoleEntry {
            level,
            message: message.to_string(),
        });
    }

    /// Snapshot of all recorded entries
    pub fn entries(&self) -> Vec<ConsoleEntry> {
        self.lock().clone()
    }

    /// Messages recorded at the given level, in order
    pub fn messages(&self, level: ConsoleLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }

    /// Number of entries at `level` whose message contains `needle`
    pub fn count_containing(&self, level: ConsoleLevel, needle: &str) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.level == level && e.message.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl TrackerConsole for MemoryConsole {
    fn log(&self, message: &str) {
        self.push(ConsoleLevel::Log, message);
    }

    fn warn(&self, message: &str) {
        self.push(ConsoleLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(ConsoleLevel::Error, message);
    }

    fn group_collapsed(&self, label: &str) {
        self.push(ConsoleLevel::Group, label);
    }

    fn group_end(&self) {
        self.push(ConsoleLevel::GroupEnd, "");
    }
}

/// The sink used when none is configured
pub fn default_console() -> Arc<dyn TrackerConsole> {
    Arc::new(TracingConsole::new())
}
