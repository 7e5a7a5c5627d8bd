//! Ordered plugin pipeline.
//!
//! Hooks run phase-major: for a given hook every usable plugin runs, in registration
//! order, before the next phase starts.

use super::plugin::TrackerPlugin;
use crate::console::{default_console, TrackerConsole};
use crate::context::ContextsConfig;
use crate::event::{TrackerEvent, UntrackedEvent};
use crate::tracker::Tracker;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct TrackerPlugins {
    plugins: Vec<Arc<dyn TrackerPlugin>>,
    console: Arc<dyn TrackerConsole>,
}

impl TrackerPlugins {
    /// Create a pipeline from `plugins`. Plugins whose name is already taken are
    /// reported and left out.
    pub fn new(
        plugins: Vec<Arc<dyn TrackerPlugin>>,
        console: Option<Arc<dyn TrackerConsole>>,
    ) -> Self {
        let mut collection = Self {
            plugins: Vec::with_capacity(plugins.len()),
            console: console.unwrap_or_else(default_console),
        };

        for plugin in plugins {
            collection.add(plugin);
        }

        collection
    }

    /// Appends a plugin. Returns `false`, after reporting, if the name is taken.
    pub fn add(&mut self, plugin: Arc<dyn TrackerPlugin>) -> bool {
        if self.has(plugin.plugin_name()) {
            self.console.error(&format!(
                "TrackerPlugins: a plugin named {} is already registered.",
                plugin.plugin_name()
            ));
            return false;
        }

        debug!("Registering plugin {}", plugin.plugin_name());
        self.plugins.push(plugin);
        true
    }

    /// Removes the plugin called `name`. Unknown names are reported.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.plugins.len();
        self.plugins.retain(|p| p.plugin_name() != name);

        if self.plugins.len() == before {
            self.console
                .error(&format!("TrackerPlugins: cannot remove {}, it is not registered.", name));
            return false;
        }

        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TrackerPlugin>> {
        self.plugins.iter().find(|p| p.plugin_name() == name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.plugin_name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.plugin_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn usable(&self) -> impl Iterator<Item = &Arc<dyn TrackerPlugin>> {
        self.plugins.iter().filter(|p| p.is_usable())
    }

    pub fn initialize(&self, tracker: &Tracker) {
        for plugin in self.usable() {
            debug!("Initializing plugin {}", plugin.plugin_name());
            plugin.initialize(tracker);
        }
    }

    pub fn validate(&self, event: &UntrackedEvent) {
        for plugin in self.usable() {
            plugin.validate(event);
        }
    }

    pub fn enrich(&self, contexts: &mut ContextsConfig) {
        for plugin in self.usable() {
            plugin.enrich(contexts);
        }
    }

    pub fn before_transport(&self, event: &TrackerEvent) {
        for plugin in self.usable() {
            plugin.before_transport(event);
        }
    }
}

impl fmt::Debug for TrackerPlugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
