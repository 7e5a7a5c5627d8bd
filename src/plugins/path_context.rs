//! Plugin deriving a PathContext from the host environment.
//!
//! The core has no notion of URLs or screens. Binding layers inject a provider that
//! returns the current path (a URL pathname, a screen name...).

use super::plugin::TrackerPlugin;
use crate::context::taxonomy::{path_context, PATH_CONTEXT};
use crate::context::ContextsConfig;
use std::sync::Arc;
use tracing::debug;

pub const PATH_CONTEXT_PLUGIN: &str = "PathContextPlugin";

/// Returns the current path, or `None` when it is not known.
pub type PathProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Adds a `PathContext` to events that don't already carry one.
///
/// Unusable, and therefore skipped, when no provider is configured.
#[derive(Clone, Default)]
pub struct PathContextPlugin {
    provider: Option<PathProvider>,
}

impl PathContextPlugin {
    pub fn new(provider: Option<PathProvider>) -> Self {
        Self { provider }
    }

    pub fn from_fn<F>(provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self::new(Some(Arc::new(provider)))
    }
}

impl TrackerPlugin for PathContextPlugin {
    fn plugin_name(&self) -> &str {
        PATH_CONTEXT_PLUGIN
    }

    fn is_usable(&self) -> bool {
        self.provider.is_some()
    }

    fn enrich(&self, contexts: &mut ContextsConfig) {
        if contexts.global_contexts.iter().any(|c| c.context_type() == PATH_CONTEXT) {
            debug!("{}: PathContext already present", PATH_CONTEXT_PLUGIN);
            return;
        }

        if let Some(path) = self.provider.as_ref().and_then(|provider| provider()) {
            contexts.global_contexts.push(path_context(path));
        }
    }
}
