//! Validation of the structural rules of the open taxonomy.
//!
//! Rules:
//!
//! - every event carries exactly one `ApplicationContext` in its global contexts;
//! - interactive events carry exactly one `RootLocationContext`, at position 0 of the
//!   location stack;
//! - interactive events carry exactly one `PathContext` in their global contexts.
//!
//! Violations are diagnostics: they are written to the console and never stop an
//! event from being delivered.

use super::plugin::TrackerPlugin;
use crate::console::{default_console, TrackerConsole};
use crate::context::taxonomy::{APPLICATION_CONTEXT, PATH_CONTEXT, ROOT_LOCATION_CONTEXT};
use crate::context::AbstractContext;
use crate::event::TrackerEvent;
use crate::tracker::Tracker;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

pub const OPEN_TAXONOMY_VALIDATION_PLUGIN: &str = "OpenTaxonomyValidationPlugin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextScope {
    GlobalContexts,
    LocationStack,
}

impl fmt::Display for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextScope::GlobalContexts => write!(f, "Global Contexts"),
            ContextScope::LocationStack => write!(f, "Location Stack"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    Duplicate,
    WrongPosition,
}

/// A single broken rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyViolation {
    pub kind: ViolationKind,
    pub context_type: String,
    pub scope: ContextScope,
    pub event_type: String,
}

impl fmt::Display for TaxonomyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ViolationKind::Missing => write!(
                f,
                "{} is missing from {} of {}.",
                self.context_type, self.scope, self.event_type
            ),
            ViolationKind::Duplicate => write!(
                f,
                "Only one {} should be present in {} of {}.",
                self.context_type, self.scope, self.event_type
            ),
            ViolationKind::WrongPosition => write!(
                f,
                "{} is in the wrong position: it should be the first element of the {} of {}.",
                self.context_type, self.scope, self.event_type
            ),
        }
    }
}

fn check_cardinality<'a>(
    contexts: impl Iterator<Item = &'a AbstractContext>,
    context_type: &str,
    scope: ContextScope,
    event_type: &str,
) -> Option<TaxonomyViolation> {
    let kind = match contexts.filter(|c| c.context_type() == context_type).count() {
        0 => ViolationKind::Missing,
        1 => return None,
        _ => ViolationKind::Duplicate,
    };

    Some(TaxonomyViolation {
        kind,
        context_type: context_type.to_string(),
        scope,
        event_type: event_type.to_string(),
    })
}

/// Evaluates every taxonomy rule against `event`.
pub fn validate_taxonomy(event: &TrackerEvent) -> Vec<TaxonomyViolation> {
    let event_type = event.event_type();
    let globals = || event.global_contexts().iter().map(|c| c.as_abstract());
    let locations = || event.location_stack().iter().map(|c| c.as_abstract());

    let mut violations = Vec::new();

    violations.extend(check_cardinality(
        globals(),
        APPLICATION_CONTEXT,
        ContextScope::GlobalContexts,
        event_type,
    ));

    if !event.is_interactive() {
        return violations;
    }

    let root_violation = check_cardinality(
        locations(),
        ROOT_LOCATION_CONTEXT,
        ContextScope::LocationStack,
        event_type,
    );
    match root_violation {
        Some(violation) => violations.push(violation),
        None => {
            let first_is_root = event
                .location_stack()
                .first()
                .is_some_and(|c| c.context_type() == ROOT_LOCATION_CONTEXT);
            if !first_is_root {
                violations.push(TaxonomyViolation {
                    kind: ViolationKind::WrongPosition,
                    context_type: ROOT_LOCATION_CONTEXT.to_string(),
                    scope: ContextScope::LocationStack,
                    event_type: event_type.to_string(),
                });
            }
        }
    }

    violations.extend(check_cardinality(
        globals(),
        PATH_CONTEXT,
        ContextScope::GlobalContexts,
        event_type,
    ));

    violations
}

/// Reports taxonomy violations of every event right before transport.
///
/// The rules run on the finalized event so that contexts contributed by other plugins
/// during enrichment, such as the ApplicationContext, are taken into account.
///
/// Reports go to the console given with [`OpenTaxonomyValidationPlugin::with_console`],
/// or else to the console of the tracker that initialized the plugin.
#[derive(Default)]
pub struct OpenTaxonomyValidationPlugin {
    console: OnceLock<Arc<dyn TrackerConsole>>,
    initialized: AtomicBool,
}

impl OpenTaxonomyValidationPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends reports to `console` instead of the tracker's console.
    pub fn with_console(self, console: Arc<dyn TrackerConsole>) -> Self {
        let _ = self.console.set(console);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn console(&self) -> Arc<dyn TrackerConsole> {
        self.console.get().cloned().unwrap_or_else(default_console)
    }
}

impl TrackerPlugin for OpenTaxonomyValidationPlugin {
    fn plugin_name(&self) -> &str {
        OPEN_TAXONOMY_VALIDATION_PLUGIN
    }

    fn initialize(&self, tracker: &Tracker) {
        let _ = self.console.set(tracker.console());
        self.initialized.store(true, Ordering::SeqCst);
    }

    fn before_transport(&self, event: &TrackerEvent) {
        let console = self.console();
        if !self.is_initialized() {
            console.error(&format!(
                "{}: validation requested before initialize, skipping.",
                OPEN_TAXONOMY_VALIDATION_PLUGIN
            ));
            return;
        }

        let violations = validate_taxonomy(event);
        if violations.is_empty() {
            return;
        }

        console.group_collapsed(&format!(
            "{}: {} failed validation",
            OPEN_TAXONOMY_VALIDATION_PLUGIN,
            event.event_type()
        ));
        for violation in &violations {
            console.error(&violation.to_string());
        }
        console.group_end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleLevel, MemoryConsole};
    use crate::context::taxonomy::{
        application_context, content_context, path_context, pressable_context,
        root_location_context, PRESS_EVENT,
    };
    use crate::event::UntrackedEvent;
    use crate::tracker::TrackerConfig;

    fn initialized_plugin() -> (Arc<OpenTaxonomyValidationPlugin>, MemoryConsole) {
        let console = MemoryConsole::new();
        let plugin = Arc::new(OpenTaxonomyValidationPlugin::new());
        let _tracker = Tracker::new(
            TrackerConfig::new("app")
                .with_plugins(vec![plugin.clone()])
                .with_console(Arc::new(console.clone())),
        );
        (plugin, console)
    }

    fn valid_press_event() -> UntrackedEvent {
        UntrackedEvent::interactive(PRESS_EVENT)
            .with_location(root_location_context("home"))
            .with_location(pressable_context("buy"))
            .with_global(application_context("app"))
            .with_global(path_context("/"))
    }

    #[test]
    fn test_valid_interactive_event() {
        let event = TrackerEvent::new(valid_press_event());
        assert!(validate_taxonomy(&event).is_empty());
    }

    #[test]
    fn test_duplicate_application_context_reported_once() {
        let (plugin, console) = initialized_plugin();
        let event = TrackerEvent::new(
            UntrackedEvent::new("test-event")
                .with_global(application_context("app"))
                .with_global(application_context("app")),
        );

        plugin.before_transport(&event);

        assert_eq!(
            console.count_containing(
                ConsoleLevel::Error,
                "Only one ApplicationContext should be present"
            ),
            1
        );
        assert_eq!(console.messages(ConsoleLevel::Error).len(), 1);
    }

    #[test]
    fn test_missing_application_context() {
        let event = TrackerEvent::new(UntrackedEvent::new("test-event"));
        let violations = validate_taxonomy(&event);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Missing);
        assert_eq!(
            violations[0].to_string(),
            "ApplicationContext is missing from Global Contexts of test-event."
        );
    }

    #[test]
    fn test_root_location_context_missing() {
        let event = TrackerEvent::new(
            UntrackedEvent::interactive(PRESS_EVENT)
                .with_location(pressable_context("buy"))
                .with_global(application_context("app"))
                .with_global(path_context("/")),
        );

        let violations = validate_taxonomy(&event);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Missing);
        assert_eq!(violations[0].context_type, ROOT_LOCATION_CONTEXT);
    }

    #[test]
    fn test_root_location_context_wrong_position() {
        let event = TrackerEvent::new(
            UntrackedEvent::interactive(PRESS_EVENT)
                .with_location(content_context("section"))
                .with_location(root_location_context("home"))
                .with_global(application_context("app"))
                .with_global(path_context("/")),
        );

        let violations = validate_taxonomy(&event);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::WrongPosition);
        assert!(violations[0].to_string().contains("wrong position"));
    }

    #[test]
    fn test_duplicate_root_and_missing_path() {
        let event = TrackerEvent::new(
            UntrackedEvent::interactive(PRESS_EVENT)
                .with_location(root_location_context("home"))
                .with_location(root_location_context("home"))
                .with_global(application_context("app")),
        );

        let kinds: Vec<_> = validate_taxonomy(&event).iter().map(|v| v.kind).collect();

        assert_eq!(kinds, vec![ViolationKind::Duplicate, ViolationKind::Missing]);
    }

    #[test]
    fn test_non_interactive_events_are_exempt() {
        let event = TrackerEvent::new(
            UntrackedEvent::non_interactive("VisibleEvent")
                .with_location(content_context("section"))
                .with_global(application_context("app")),
        );

        assert!(validate_taxonomy(&event).is_empty());
    }

    #[test]
    fn test_violations_grouped_per_event() {
        let (plugin, console) = initialized_plugin();
        let event = TrackerEvent::new(UntrackedEvent::interactive(PRESS_EVENT));

        plugin.before_transport(&event);

        assert_eq!(
            console.count_containing(ConsoleLevel::Group, "PressEvent failed validation"),
            1
        );
        assert_eq!(console.messages(ConsoleLevel::Error).len(), 3);
        assert_eq!(console.messages(ConsoleLevel::GroupEnd).len(), 1);
    }

    #[test]
    fn test_before_initialize_is_reported_and_skipped() {
        let console = MemoryConsole::new();
        let plugin = OpenTaxonomyValidationPlugin::new().with_console(Arc::new(console.clone()));
        assert!(!plugin.is_initialized());

        plugin.before_transport(&TrackerEvent::new(UntrackedEvent::new("test-event")));

        assert!(!plugin.is_initialized());
        assert_eq!(console.count_containing(ConsoleLevel::Error, "before initialize"), 1);
        assert_eq!(console.count_containing(ConsoleLevel::Error, "missing"), 0);
    }

    #[test]
    fn test_own_console_wins_over_tracker_console() {
        let own = MemoryConsole::new();
        let tracker_console = MemoryConsole::new();
        let plugin =
            Arc::new(OpenTaxonomyValidationPlugin::new().with_console(Arc::new(own.clone())));
        let _tracker = Tracker::new(
            TrackerConfig::new("app")
                .with_plugins(vec![plugin.clone()])
                .with_console(Arc::new(tracker_console.clone())),
        );
        assert!(plugin.is_initialized());

        plugin.before_transport(&TrackerEvent::new(UntrackedEvent::new("test-event")));

        assert_eq!(own.count_containing(ConsoleLevel::Error, "is missing"), 1);
        assert!(tracker_console.is_empty());
    }
}
