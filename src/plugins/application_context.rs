//! Plugin attaching the tracker's ApplicationContext to every event.

use super::plugin::TrackerPlugin;
use crate::console::{default_console, TrackerConsole};
use crate::context::taxonomy::application_context;
use crate::context::ContextsConfig;
use crate::tracker::Tracker;
use std::sync::{Arc, OnceLock};
use tracing::debug;

pub const APPLICATION_CONTEXT_PLUGIN: &str = "ApplicationContextPlugin";

/// Appends an `ApplicationContext` carrying the tracker's application id to the
/// global contexts of every event, after all merged contexts.
///
/// The application id is captured on the first `initialize`; later initializations
/// (e.g. when a derived tracker shares the plugin) keep the original id. Diagnostics go
/// to the console given with [`ApplicationContextPlugin::with_console`], or else to the
/// initializing tracker's console.
#[derive(Default)]
pub struct ApplicationContextPlugin {
    application_id: OnceLock<String>,
    console: OnceLock<Arc<dyn TrackerConsole>>,
}

impl ApplicationContextPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends diagnostics to `console` instead of the tracker's console.
    pub fn with_console(self, console: Arc<dyn TrackerConsole>) -> Self {
        let _ = self.console.set(console);
        self
    }

    pub fn application_id(&self) -> Option<&str> {
        self.application_id.get().map(String::as_str)
    }
}

impl TrackerPlugin for ApplicationContextPlugin {
    fn plugin_name(&self) -> &str {
        APPLICATION_CONTEXT_PLUGIN
    }

    fn initialize(&self, tracker: &Tracker) {
        let _ = self.console.set(tracker.console());
        if self.application_id.set(tracker.application_id().to_string()).is_ok() {
            debug!("{} initialized for {}", APPLICATION_CONTEXT_PLUGIN, tracker.application_id());
        }
    }

    fn enrich(&self, contexts: &mut ContextsConfig) {
        let Some(id) = self.application_id.get() else {
            let console = self.console.get().cloned().unwrap_or_else(default_console);
            console.error(&format!(
                "{}: enrich called before initialize, skipping.",
                APPLICATION_CONTEXT_PLUGIN
            ));
            return;
        };

        contexts.global_contexts.push(application_context(id.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleLevel, MemoryConsole};
    use crate::context::taxonomy::APPLICATION_CONTEXT;
    use crate::context::GlobalContext;
    use crate::tracker::TrackerConfig;

    #[test]
    fn test_enrich_appends_application_context_last() {
        let plugin = Arc::new(ApplicationContextPlugin::new());
        let tracker = Tracker::new(
            TrackerConfig::new("app-id")
                .with_plugins(vec![plugin.clone()])
                .with_console(Arc::new(MemoryConsole::new())),
        );
        assert_eq!(tracker.application_id(), "app-id");

        let mut contexts =
            ContextsConfig::default().with_global(GlobalContext::new("PathContext", "/"));
        plugin.enrich(&mut contexts);

        let last = contexts.global_contexts.last().unwrap();
        assert_eq!(contexts.global_contexts.len(), 2);
        assert!(last.is(APPLICATION_CONTEXT, "app-id"));
    }

    #[test]
    fn test_first_initialize_wins() {
        let plugin = Arc::new(ApplicationContextPlugin::new());
        let console: Arc<dyn TrackerConsole> = Arc::new(MemoryConsole::new());

        let _first = Tracker::new(
            TrackerConfig::new("first")
                .with_plugins(vec![plugin.clone()])
                .with_console(console.clone()),
        );
        let _second = Tracker::new(
            TrackerConfig::new("second").with_plugins(vec![plugin.clone()]).with_console(console),
        );

        assert_eq!(plugin.application_id(), Some("first"));
    }

    #[test]
    fn test_enrich_before_initialize_is_reported_and_skipped() {
        let console = MemoryConsole::new();
        let plugin = ApplicationContextPlugin::new().with_console(Arc::new(console.clone()));
        let mut contexts = ContextsConfig::default();

        plugin.enrich(&mut contexts);

        assert!(contexts.global_contexts.is_empty());
        assert_eq!(console.count_containing(ConsoleLevel::Error, "before initialize"), 1);
    }
}
