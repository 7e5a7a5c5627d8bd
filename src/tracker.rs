//! The tracker: composes events with ambient contexts, runs the plugin pipeline and
//! hands finalized events to a transport.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tracker_core::console::NoopConsole;
//! use tracker_core::event::UntrackedEvent;
//! use tracker_core::tracker::{Tracker, TrackerConfig};
//!
//! let tracker = Tracker::new(TrackerConfig::new("app-id").with_console(Arc::new(NoopConsole)));
//! let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);
//!
//! assert_eq!(tracker.plugins().len(), 1);
//! assert_eq!(event.global_contexts()[0].id(), "app-id");
//! ```

use crate::console::{default_console, TrackerConsole};
use crate::context::{merge_contexts, ContextsConfig, GlobalContext, LocationContext};
use crate::error::Result;
use crate::event::{TrackerEvent, UntrackedEvent};
use crate::handoff::Handoff;
use crate::plugins::{
    ApplicationContextPlugin, TrackerPlugin, TrackerPlugins, APPLICATION_CONTEXT_PLUGIN,
};
use crate::queue::TrackerQueue;
use crate::transport::{QueuedTransport, TrackerTransport};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything needed to build a [`Tracker`]
#[derive(Clone)]
pub struct TrackerConfig {
    pub application_id: String,
    /// Defaults to the application id.
    pub tracker_id: Option<String>,
    pub active: bool,
    pub location_stack: Vec<LocationContext>,
    pub global_contexts: Vec<GlobalContext>,
    /// An `ApplicationContextPlugin` is prepended unless one is listed.
    pub plugins: Vec<Arc<dyn TrackerPlugin>>,
    pub transport: Option<Arc<dyn TrackerTransport>>,
    pub queue: Option<Arc<TrackerQueue>>,
    pub console: Option<Arc<dyn TrackerConsole>>,
}

impl TrackerConfig {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            tracker_id: None,
            active: true,
            location_stack: Vec::new(),
            global_contexts: Vec::new(),
            plugins: Vec::new(),
            transport: None,
            queue: None,
            console: None,
        }
    }

    pub fn with_tracker_id(mut self, tracker_id: impl Into<String>) -> Self {
        self.tracker_id = Some(tracker_id.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_location_stack(mut self, location_stack: Vec<LocationContext>) -> Self {
        self.location_stack = location_stack;
        self
    }

    pub fn with_global_contexts(mut self, global_contexts: Vec<GlobalContext>) -> Self {
        self.global_contexts = global_contexts;
        self
    }

    /// Appends both halves of `contexts` to the ambient contexts.
    pub fn with_contexts(mut self, contexts: ContextsConfig) -> Self {
        self.location_stack.extend(contexts.location_stack);
        self.global_contexts.extend(contexts.global_contexts);
        self
    }

    pub fn with_plugins(mut self, plugins: Vec<Arc<dyn TrackerPlugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn TrackerTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_queue(mut self, queue: Arc<TrackerQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_console(mut self, console: Arc<dyn TrackerConsole>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn tracker_id(&self) -> &str {
        self.tracker_id.as_deref().unwrap_or(&self.application_id)
    }

    /// Whether `tracker` could have been built from this config.
    pub fn matches(&self, tracker: &Tracker) -> bool {
        self.application_id == tracker.application_id
            && self.tracker_id() == tracker.tracker_id
            && self.location_stack == tracker.location_stack
            && self.global_contexts == tracker.global_contexts
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("application_id", &self.application_id)
            .field("tracker_id", &self.tracker_id)
            .field("active", &self.active)
            .field("location_stack", &self.location_stack)
            .field("global_contexts", &self.global_contexts)
            .field("plugins", &self.plugins.iter().map(|p| p.plugin_name()).collect::<Vec<_>>())
            .field("transport", &self.transport.as_ref().map(|t| t.transport_name()))
            .field("queue", &self.queue.is_some())
            .finish()
    }
}

/// Composes, enriches and dispatches events.
///
/// Every tracked event goes through:
///
/// 1. composition with the ambient contexts and any extra configs;
/// 2. `validate` on all usable plugins;
/// 3. `enrich` on all usable plugins;
/// 4. finalization with a fresh `id` and `time`;
/// 5. `before_transport` on all usable plugins;
/// 6. hand-off to the transport, when one is configured and usable.
///
/// Hand-offs are ordered: events reach the transport (or its queue) in the order they
/// were tracked, including events tracked through derived trackers.
///
/// Validation and configuration problems are written to the console and never stop an
/// event from being dispatched.
pub struct Tracker {
    application_id: String,
    tracker_id: String,
    active: AtomicBool,
    location_stack: Vec<LocationContext>,
    global_contexts: Vec<GlobalContext>,
    plugins: TrackerPlugins,
    handoff: Option<Arc<Handoff>>,
    queue: Option<Arc<TrackerQueue>>,
    console: Arc<dyn TrackerConsole>,
}

impl Tracker {
    /// Create a tracker and initialize its plugins.
    ///
    /// # Arguments
    ///
    /// * `config` - Identity, ambient contexts, plugins and delivery setup. When both a
    ///   transport and a queue are configured, events are queued and the queue drains
    ///   into the transport.
    pub fn new(config: TrackerConfig) -> Self {
        let console = config.console.clone().unwrap_or_else(default_console);
        let tracker_id = config.tracker_id().to_string();

        let mut plugins = config.plugins;
        if !plugins.iter().any(|p| p.plugin_name() == APPLICATION_CONTEXT_PLUGIN) {
            plugins.insert(0, Arc::new(ApplicationContextPlugin::new()));
        }

        let transport: Option<Arc<dyn TrackerTransport>> =
            match (config.transport, &config.queue) {
                (Some(transport), Some(queue)) => {
                    Some(Arc::new(QueuedTransport::new(queue.clone(), transport)))
                }
                (Some(transport), None) => Some(transport),
                (None, Some(_)) => {
                    console.error(&format!(
                        "Tracker {}: a TrackerQueue was configured without a TrackerTransport, \
                         events will not be delivered.",
                        tracker_id
                    ));
                    None
                }
                (None, None) => None,
            };

        let tracker = Self {
            application_id: config.application_id,
            tracker_id,
            active: AtomicBool::new(config.active),
            location_stack: config.location_stack,
            global_contexts: config.global_contexts,
            plugins: TrackerPlugins::new(plugins, Some(console.clone())),
            handoff: transport.map(|transport| Arc::new(Handoff::new(transport))),
            queue: config.queue,
            console,
        };

        tracker.plugins.initialize(&tracker);
        debug!("Tracker {} created with plugins {:?}", tracker.tracker_id, tracker.plugins);

        tracker
    }

    /// A new, independent tracker extending `tracker`'s ambient contexts with `contexts`.
    ///
    /// Plugins, transport and queue are shared with the original, and so is the ordered
    /// hand-off to the transport.
    ///
    /// # Arguments
    ///
    /// * `tracker` - The tracker to derive from
    /// * `contexts` - Contexts appended to the ambient location stack and global contexts
    pub fn from_tracker(tracker: &Tracker, contexts: ContextsConfig) -> Self {
        let mut location_stack = tracker.location_stack.clone();
        location_stack.extend(contexts.location_stack);

        let mut global_contexts = tracker.global_contexts.clone();
        global_contexts.extend(contexts.global_contexts);

        let derived = Self {
            application_id: tracker.application_id.clone(),
            tracker_id: tracker.tracker_id.clone(),
            active: AtomicBool::new(tracker.is_active()),
            location_stack,
            global_contexts,
            plugins: tracker.plugins.clone(),
            handoff: tracker.handoff.clone(),
            queue: tracker.queue.clone(),
            console: tracker.console.clone(),
        };

        derived.plugins.initialize(&derived);
        derived
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn tracker_id(&self) -> &str {
        &self.tracker_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn location_stack(&self) -> &[LocationContext] {
        &self.location_stack
    }

    pub fn global_contexts(&self) -> &[GlobalContext] {
        &self.global_contexts
    }

    /// Ambient contexts as a composable config
    pub fn contexts(&self) -> ContextsConfig {
        ContextsConfig::new(self.location_stack.clone(), self.global_contexts.clone())
    }

    pub fn plugins(&self) -> &TrackerPlugins {
        &self.plugins
    }

    pub fn transport(&self) -> Option<&Arc<dyn TrackerTransport>> {
        self.handoff.as_ref().map(|handoff| handoff.transport())
    }

    pub fn queue(&self) -> Option<&Arc<TrackerQueue>> {
        self.queue.as_ref()
    }

    pub fn console(&self) -> Arc<dyn TrackerConsole> {
        self.console.clone()
    }

    /// Merges the ambient contexts, `extra` and the event's own contexts.
    ///
    /// The ambient contexts are the outermost scope: their locations lead the stack and
    /// their global contexts close the list.
    fn compose(&self, event: UntrackedEvent, extra: &[ContextsConfig]) -> UntrackedEvent {
        let (event_type, own, properties) = event.into_parts();
        let scoped = merge_contexts(extra, &own);

        let location_stack = self
            .location_stack
            .iter()
            .cloned()
            .chain(scoped.location_stack)
            .collect();
        let global_contexts = scoped
            .global_contexts
            .into_iter()
            .chain(self.global_contexts.iter().cloned())
            .collect();

        UntrackedEvent::from_parts(
            event_type,
            ContextsConfig::new(location_stack, global_contexts),
            properties,
        )
    }

    /// Composes, runs the plugin pipeline and finalizes `event`.
    fn finalize(&self, event: UntrackedEvent, extra: &[ContextsConfig]) -> TrackerEvent {
        let event = self.compose(event, extra);

        if !self.is_active() {
            return TrackerEvent::new(event);
        }

        self.plugins.validate(&event);

        let (event_type, mut contexts, properties) = event.into_parts();
        self.plugins.enrich(&mut contexts);

        let finalized = TrackerEvent::new(UntrackedEvent::from_parts(
            event_type, contexts, properties,
        ));
        self.plugins.before_transport(&finalized);

        finalized
    }

    fn usable_handoff(&self) -> Option<&Handoff> {
        let handoff = self.handoff.as_deref()?;
        let transport = handoff.transport();
        if !transport.is_usable() {
            debug!("{} is not usable, event not dispatched", transport.transport_name());
            return None;
        }
        Some(handoff)
    }

    /// Tracks `event` and dispatches it in the background.
    ///
    /// Returns the finalized event whatever happens to its delivery. Delivery runs on
    /// the current tokio runtime, after every event tracked before; without a runtime
    /// the event is reported and dropped.
    pub fn track_event(&self, event: UntrackedEvent, extra: &[ContextsConfig]) -> TrackerEvent {
        let event = self.finalize(event, extra);

        if !self.is_active() {
            return event;
        }

        if let Some(handoff) = self.usable_handoff() {
            if let Err(event) = handoff.send(event.clone()) {
                self.console.error(&format!(
                    "Tracker {}: no tokio runtime available, {} ({}) was not delivered.",
                    self.tracker_id,
                    event.event_type(),
                    event.id()
                ));
            }
        }

        event
    }

    /// Tracks `event` and waits for the transport to accept it.
    ///
    /// Events tracked earlier with [`Tracker::track_event`] are handed off first.
    pub async fn track_event_and_deliver(
        &self,
        event: UntrackedEvent,
        extra: &[ContextsConfig],
    ) -> Result<TrackerEvent> {
        let event = self.finalize(event, extra);

        if self.is_active() {
            if let Some(handoff) = self.usable_handoff() {
                handoff.settled().await;
                handoff.transport().handle(vec![event.clone()]).await?;
            }
        }

        Ok(event)
    }

    /// Delivers everything tracked so far through the queue. Returns the number of
    /// delivered events.
    pub async fn flush_queue(&self) -> Result<usize> {
        let Some(queue) = &self.queue else {
            return Ok(0);
        };

        if let Some(handoff) = &self.handoff {
            handoff.settled().await;
        }
        queue.flush().await
    }

    /// Waits until every tracked event went through the transport and the queue, if
    /// any, is drained. Returns `false` on timeout.
    pub async fn wait_for_queue(&self, timeout: Duration) -> bool {
        let started = Instant::now();

        if let Some(handoff) = &self.handoff {
            if !handoff.settled_within(timeout).await {
                return false;
            }
        }

        match &self.queue {
            Some(queue) => queue.wait_until_empty(timeout.saturating_sub(started.elapsed())).await,
            None => true,
        }
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("application_id", &self.application_id)
            .field("tracker_id", &self.tracker_id)
            .field("active", &self.is_active())
            .field("location_stack", &self.location_stack)
            .field("global_contexts", &self.global_contexts)
            .field("plugins", &self.plugins)
            .field("transport", &self.transport().map(|t| t.transport_name()))
            .field("pending", &self.handoff.as_ref().map_or(0, |h| h.pending()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{ConsoleLevel, MemoryConsole};
    use crate::context::taxonomy::{
        application_context, path_context, pressable_context, root_location_context,
        APPLICATION_CONTEXT, PRESS_EVENT,
    };
    use crate::plugins::OpenTaxonomyValidationPlugin;
    use crate::queue::TrackerQueueConfig;
    use crate::transport::testing::RecordingTransport;
    use crate::waiting::wait_until;
    use std::sync::atomic::AtomicUsize;

    fn location(id: &str) -> LocationContext {
        LocationContext::new("ContentContext", id)
    }

    fn global(id: &str) -> GlobalContext {
        GlobalContext::new("CustomGlobalContext", id)
    }

    fn quiet_config(application_id: &str) -> (TrackerConfig, MemoryConsole) {
        let console = MemoryConsole::new();
        let config = TrackerConfig::new(application_id).with_console(Arc::new(console.clone()));
        (config, console)
    }

    /// Counts how often each hook ran.
    #[derive(Default)]
    struct CountingPlugin {
        validated: AtomicUsize,
        enriched: AtomicUsize,
        observed: AtomicUsize,
    }

    impl TrackerPlugin for CountingPlugin {
        fn plugin_name(&self) -> &str {
            "CountingPlugin"
        }

        fn validate(&self, _event: &UntrackedEvent) {
            self.validated.fetch_add(1, Ordering::SeqCst);
        }

        fn enrich(&self, _contexts: &mut ContextsConfig) {
            self.enriched.fetch_add(1, Ordering::SeqCst);
        }

        fn before_transport(&self, _event: &TrackerEvent) {
            self.observed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_default_plugin_list() {
        let (config, _) = quiet_config("app-id");
        let tracker = Tracker::new(config);

        assert_eq!(tracker.plugins().names(), vec![APPLICATION_CONTEXT_PLUGIN]);
        assert_eq!(tracker.tracker_id(), "app-id");
        assert!(tracker.is_active());
    }

    #[test]
    fn test_application_context_plugin_is_prepended() {
        let (config, _) = quiet_config("app-id");
        let tracker = Tracker::new(config.with_plugins(vec![Arc::new(CountingPlugin::default())]));

        assert_eq!(tracker.plugins().names(), vec![APPLICATION_CONTEXT_PLUGIN, "CountingPlugin"]);
    }

    #[test]
    fn test_bare_event_gets_application_context_last() {
        let (config, _) = quiet_config("app-id");
        let tracker = Tracker::new(config.with_global_contexts(vec![global("X")]));

        let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert_eq!(event.event_type(), "test-event");
        assert_eq!(event.global_contexts().len(), 2);
        let last = event.global_contexts().last().unwrap();
        assert!(last.is(APPLICATION_CONTEXT, "app-id"));
        assert!(!event.id().is_empty());
        assert!(event.time() > 0);
    }

    #[test]
    fn test_composition_order() {
        let (config, _) = quiet_config("app-id");
        let tracker = Tracker::new(
            config
                .with_location_stack(vec![location("A"), location("B")])
                .with_global_contexts(vec![global("X"), global("Y")]),
        );

        let extra = ContextsConfig::new(vec![location("C")], vec![global("Z")]);
        let event = tracker.track_event(
            UntrackedEvent::new("test-event")
                .with_location(location("D"))
                .with_global(global("W")),
            &[extra],
        );

        let locations: Vec<_> = event.location_stack().iter().map(|c| c.id()).collect();
        let globals: Vec<_> = event.global_contexts().iter().map(|c| c.id()).collect();

        assert_eq!(locations, vec!["A", "B", "C", "D"]);
        assert_eq!(globals, vec!["W", "Z", "X", "Y", "app-id"]);
    }

    #[test]
    fn test_from_tracker_is_independent() {
        let (config, _) = quiet_config("app-id");
        let original = Tracker::new(
            config
                .with_location_stack(vec![location("A")])
                .with_global_contexts(vec![global("X")]),
        );

        let clone = Tracker::from_tracker(&original, ContextsConfig::default());
        assert_eq!(clone.location_stack(), original.location_stack());
        assert_eq!(clone.global_contexts(), original.global_contexts());
        assert_eq!(clone.plugins().names(), original.plugins().names());

        let section = Tracker::from_tracker(
            &clone,
            ContextsConfig::new(vec![location("B")], vec![global("Y")]),
        );
        section.set_active(false);

        assert_eq!(section.location_stack().len(), 2);
        assert_eq!(section.global_contexts().len(), 2);
        assert_eq!(clone.location_stack().len(), 1);
        assert_eq!(original.location_stack().len(), 1);
        assert_eq!(original.global_contexts().len(), 1);
        assert!(original.is_active());
    }

    #[test]
    fn test_inactive_tracker_skips_plugins() {
        let (config, _) = quiet_config("app-id");
        let counting = Arc::new(CountingPlugin::default());
        let tracker = Tracker::new(config.with_active(false).with_plugins(vec![counting.clone()]));

        let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert!(event.global_contexts().is_empty());
        assert_eq!(counting.validated.load(Ordering::SeqCst), 0);

        tracker.set_active(true);
        tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert_eq!(counting.validated.load(Ordering::SeqCst), 1);
        assert_eq!(counting.enriched.load(Ordering::SeqCst), 1);
        assert_eq!(counting.observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_track_event_dispatches_in_background() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("recording"));
        let tracker = Tracker::new(config.with_transport(transport.clone()));

        let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        let recorded = transport.clone();
        let delivered = wait_until(
            move || {
                let recorded = recorded.clone();
                async move { recorded.calls() == 1 }
            },
            Duration::from_millis(5),
            Duration::from_secs(2),
        )
        .await;

        assert!(delivered);
        assert_eq!(transport.delivered_ids(), vec![event.id().to_string()]);
    }

    #[tokio::test]
    async fn test_track_event_and_deliver_surfaces_errors() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("down").failing(1));
        let tracker = Tracker::new(config.with_transport(transport.clone()));

        let result = tracker.track_event_and_deliver(UntrackedEvent::new("test-event"), &[]).await;
        assert!(result.is_err());

        let event = tracker
            .track_event_and_deliver(UntrackedEvent::new("test-event"), &[])
            .await
            .unwrap();
        assert_eq!(transport.delivered_ids(), vec![event.id().to_string()]);
    }

    #[tokio::test]
    async fn test_unusable_transport_is_a_no_op() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("offline").unusable());
        let tracker = Tracker::new(config.with_transport(transport.clone()));

        let result = tracker.track_event_and_deliver(UntrackedEvent::new("test-event"), &[]).await;

        assert!(result.is_ok());
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_queue_without_transport_is_reported() {
        let (config, console) = quiet_config("app-id");
        let queue = Arc::new(TrackerQueue::new(TrackerQueueConfig::default()));
        let tracker = Tracker::new(config.with_queue(queue));

        tracker.track_event(UntrackedEvent::new("test-event"), &[]);
        tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert!(tracker.transport().is_none());
        assert_eq!(
            console.count_containing(ConsoleLevel::Error, "without a TrackerTransport"),
            1
        );
    }

    #[test]
    fn test_track_event_outside_runtime_is_reported() {
        let (config, console) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("recording"));
        let tracker = Tracker::new(config.with_transport(transport.clone()));

        let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert_eq!(event.event_type(), "test-event");
        assert_eq!(transport.calls(), 0);
        assert_eq!(console.count_containing(ConsoleLevel::Error, "no tokio runtime"), 1);
    }

    #[tokio::test]
    async fn test_queued_delivery_and_flush() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("recording"));
        let queue = Arc::new(TrackerQueue::new(TrackerQueueConfig {
            batch_size: 10,
            batch_delay: Duration::from_secs(60),
        }));
        let tracker = Tracker::new(config.with_transport(transport.clone()).with_queue(queue));

        let first = tracker
            .track_event_and_deliver(UntrackedEvent::new("test-event"), &[])
            .await
            .unwrap();
        let second = tracker
            .track_event_and_deliver(UntrackedEvent::new("test-event"), &[])
            .await
            .unwrap();

        tracker.flush_queue().await.unwrap();

        assert!(tracker.wait_for_queue(Duration::from_secs(1)).await);
        assert_eq!(
            transport.delivered_ids(),
            vec![first.id().to_string(), second.id().to_string()]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tracked_events_are_queued_in_call_order() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("recording"));
        let queue = Arc::new(TrackerQueue::new(TrackerQueueConfig {
            batch_size: 50,
            batch_delay: Duration::from_secs(60),
        }));
        let tracker = Tracker::new(config.with_transport(transport.clone()).with_queue(queue));

        let tracked: Vec<String> = (0..500)
            .map(|_| {
                let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);
                event.id().to_string()
            })
            .collect();

        let delivered = tracker.flush_queue().await.unwrap();

        assert_eq!(delivered, 500);
        assert_eq!(transport.delivered_ids(), tracked);
    }

    #[tokio::test]
    async fn test_wait_for_queue_covers_events_not_yet_queued() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("recording"));
        let queue = Arc::new(TrackerQueue::new(TrackerQueueConfig {
            batch_size: 10,
            batch_delay: Duration::from_millis(10),
        }));
        let tracker = Tracker::new(config.with_transport(transport.clone()).with_queue(queue));

        let event = tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert!(tracker.wait_for_queue(Duration::from_secs(2)).await);
        assert_eq!(transport.delivered_ids(), vec![event.id().to_string()]);
    }

    #[tokio::test]
    async fn test_wait_for_queue_times_out_on_slow_transport() {
        let (config, _) = quiet_config("app-id");
        let transport =
            Arc::new(RecordingTransport::new("slow").with_delay(Duration::from_millis(200)));
        let tracker = Tracker::new(config.with_transport(transport.clone()));

        tracker.track_event(UntrackedEvent::new("test-event"), &[]);

        assert!(!tracker.wait_for_queue(Duration::from_millis(20)).await);
        assert!(tracker.wait_for_queue(Duration::from_secs(2)).await);
        assert_eq!(transport.delivered_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_derived_trackers_share_the_ordered_hand_off() {
        let (config, _) = quiet_config("app-id");
        let transport = Arc::new(RecordingTransport::new("recording"));
        let app = Tracker::new(config.with_transport(transport.clone()));
        let section = Tracker::from_tracker(&app, ContextsConfig::default());

        let first = app.track_event(UntrackedEvent::new("test-event"), &[]);
        let second = section.track_event(UntrackedEvent::new("test-event"), &[]);
        let third = app
            .track_event_and_deliver(UntrackedEvent::new("test-event"), &[])
            .await
            .unwrap();

        assert_eq!(
            transport.delivered_ids(),
            vec![first.id().to_string(), second.id().to_string(), third.id().to_string()]
        );
    }

    #[test]
    fn test_well_formed_event_passes_taxonomy_validation() {
        let (config, console) = quiet_config("app-id");
        let tracker = Tracker::new(
            config
                .with_plugins(vec![Arc::new(OpenTaxonomyValidationPlugin::new())])
                .with_location_stack(vec![root_location_context("home")])
                .with_global_contexts(vec![path_context("/")]),
        );

        tracker.track_event(
            UntrackedEvent::interactive(PRESS_EVENT).with_location(pressable_context("buy")),
            &[],
        );
        assert!(console.messages(ConsoleLevel::Error).is_empty());

        tracker.track_event(
            UntrackedEvent::new("test-event").with_global(application_context("app-id")),
            &[],
        );
        assert_eq!(
            console.count_containing(
                ConsoleLevel::Error,
                "Only one ApplicationContext should be present"
            ),
            1
        );
    }
}
