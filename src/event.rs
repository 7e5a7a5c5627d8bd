//! Trackable events.
//!
//! An [`UntrackedEvent`] is what callers and binding layers build: an event type, its
//! own contexts and any extra properties. The tracker composes it with its ambient
//! state and, once the plugin pipeline has run, finalizes it into an immutable
//! [`TrackerEvent`] by stamping a unique `id` and an epoch-millisecond `time`.
//!
//! # Examples
//!
//! ```
//! use tracker_core::context::taxonomy::{pressable_context, PRESS_EVENT};
//! use tracker_core::event::{TrackerEvent, UntrackedEvent};
//!
//! let event = UntrackedEvent::interactive(PRESS_EVENT).with_location(pressable_context("buy"));
//! assert!(event.is_interactive());
//!
//! let tracked = TrackerEvent::new(event);
//! let wire = tracked.to_wire().unwrap();
//! assert_eq!(wire["_type"], "PressEvent");
//! assert!(wire.get("__interactive_event").is_none());
//! ```

use crate::context::taxonomy::{
    is_interactive_event_type, INTERACTIVE_EVENT_MARKER, NON_INTERACTIVE_EVENT_MARKER,
    RESERVED_KEY_PREFIX,
};
use crate::context::{merge_contexts, ContextsConfig, GlobalContext, LocationContext};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An event that has not gone through a tracker yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntrackedEvent {
    #[serde(rename = "_type")]
    event_type: String,
    #[serde(default)]
    location_stack: Vec<LocationContext>,
    #[serde(default)]
    global_contexts: Vec<GlobalContext>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl UntrackedEvent {
    /// Interactive event types of the standard taxonomy, such as `PressEvent`, are
    /// marked interactive.
    pub fn new(event_type: impl Into<String>) -> Self {
        let event = Self {
            event_type: event_type.into(),
            location_stack: Vec::new(),
            global_contexts: Vec::new(),
            properties: Map::new(),
        };

        if is_interactive_event_type(&event.event_type) {
            event.with_property(INTERACTIVE_EVENT_MARKER, true)
        } else {
            event
        }
    }

    /// An event triggered by a user interaction
    pub fn interactive(event_type: impl Into<String>) -> Self {
        Self::new(event_type).with_property(INTERACTIVE_EVENT_MARKER, true)
    }

    /// An event not triggered by a user interaction, whatever its type
    pub fn non_interactive(event_type: impl Into<String>) -> Self {
        let mut event = Self::new(event_type);
        event.properties.remove(INTERACTIVE_EVENT_MARKER);
        event.with_property(NON_INTERACTIVE_EVENT_MARKER, true)
    }

    /// Builds an event whose own contexts are merged with `configs` (outermost first).
    pub fn from_configs(
        event_type: impl Into<String>,
        own: &ContextsConfig,
        configs: &[ContextsConfig],
    ) -> Self {
        Self::new(event_type).with_contexts(merge_contexts(configs, own))
    }

    pub fn with_location(mut self, context: LocationContext) -> Self {
        self.location_stack.push(context);
        self
    }

    pub fn with_global(mut self, context: GlobalContext) -> Self {
        self.global_contexts.push(context);
        self
    }

    /// Appends both halves of `contexts` to the event's own contexts.
    pub fn with_contexts(mut self, contexts: ContextsConfig) -> Self {
        self.location_stack.extend(contexts.location_stack);
        self.global_contexts.extend(contexts.global_contexts);
        self
    }

    /// Adds an extra property. The reserved event fields are ignored.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !matches!(
            key.as_str(),
            "_type" | "id" | "time" | "location_stack" | "global_contexts"
        ) {
            self.properties.insert(key, value.into());
        }
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn location_stack(&self) -> &[LocationContext] {
        &self.location_stack
    }

    pub fn global_contexts(&self) -> &[GlobalContext] {
        &self.global_contexts
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// The event's own contexts as a composable config
    pub fn contexts(&self) -> ContextsConfig {
        ContextsConfig::new(self.location_stack.clone(), self.global_contexts.clone())
    }

    pub fn is_interactive(&self) -> bool {
        is_flag_set(&self.properties, INTERACTIVE_EVENT_MARKER)
    }

    pub(crate) fn into_parts(self) -> (String, ContextsConfig, Map<String, Value>) {
        (
            self.event_type,
            ContextsConfig::new(self.location_stack, self.global_contexts),
            self.properties,
        )
    }

    pub(crate) fn from_parts(
        event_type: String,
        contexts: ContextsConfig,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            event_type,
            location_stack: contexts.location_stack,
            global_contexts: contexts.global_contexts,
            properties,
        }
    }
}

/// A finalized event, ready to be handed to a queue or a transport.
///
/// `id` and `time` are assigned exactly once, when the event is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    #[serde(rename = "_type")]
    event_type: String,
    id: String,
    time: i64,
    #[serde(default)]
    location_stack: Vec<LocationContext>,
    #[serde(default)]
    global_contexts: Vec<GlobalContext>,
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl TrackerEvent {
    /// Finalizes `event` with a fresh id and the current time.
    pub fn new(event: UntrackedEvent) -> Self {
        Self::with_identity(event, generate_id(), now_millis())
    }

    /// Finalizes `event` with an explicit id and time.
    pub fn with_identity(event: UntrackedEvent, id: impl Into<String>, time: i64) -> Self {
        Self {
            event_type: event.event_type,
            id: id.into(),
            time,
            location_stack: event.location_stack,
            global_contexts: event.global_contexts,
            properties: event.properties,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn location_stack(&self) -> &[LocationContext] {
        &self.location_stack
    }

    pub fn global_contexts(&self) -> &[GlobalContext] {
        &self.global_contexts
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn is_interactive(&self) -> bool {
        is_flag_set(&self.properties, INTERACTIVE_EVENT_MARKER)
    }

    /// The JSON shape sent to a collector, with every internal `__` key removed.
    pub fn to_wire(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)?;
        strip_reserved_keys(&mut value);
        Ok(value)
    }
}

fn is_flag_set(properties: &Map<String, Value>, key: &str) -> bool {
    properties.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn strip_reserved_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with(RESERVED_KEY_PREFIX));
            map.values_mut().for_each(strip_reserved_keys);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_reserved_keys),
        _ => {}
    }
}

/// A fresh unique identifier for an event
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
