//! Location and global context value objects.
//!
//! Contexts are created once and never mutated. Each construction stamps the context
//! with an [`InstanceId`] so that tree bookkeeping can tell two occurrences of an
//! otherwise identical context apart. The instance id is never serialized and is
//! ignored by equality.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;
use uuid::Uuid;

/// Synthetic per-construction identifier of a context occurrence.
///
/// `Default` generates a fresh id, which is also what deserialization uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields shared by every context: a type discriminator, an id and open-ended
/// type-specific properties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbstractContext {
    #[serde(rename = "_type")]
    context_type: String,
    id: String,
    #[serde(flatten)]
    properties: Map<String, Value>,
    #[serde(skip)]
    instance_id: InstanceId,
}

impl AbstractContext {
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            context_type: context_type.into(),
            id: id.into(),
            properties: Map::new(),
            instance_id: InstanceId::new(),
        }
    }

    /// Adds a type-specific property. `_type` and `id` are reserved and ignored here.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "_type" && key != "id" {
            self.properties.insert(key, value.into());
        }
        self
    }

    pub fn context_type(&self) -> &str {
        &self.context_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    /// Whether this context has the given type and id
    pub fn is(&self, context_type: &str, id: &str) -> bool {
        self.context_type == context_type && self.id == id
    }
}

impl PartialEq for AbstractContext {
    fn eq(&self, other: &Self) -> bool {
        self.context_type == other.context_type
            && self.id == other.id
            && self.properties == other.properties
    }
}

impl Eq for AbstractContext {}

/// A context describing where, in the application's structure, an event happened.
///
/// Location contexts form an ordered stack, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationContext(AbstractContext);

impl LocationContext {
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self(AbstractContext::new(context_type, id))
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(self.0.with_property(key, value))
    }

    pub fn as_abstract(&self) -> &AbstractContext {
        &self.0
    }
}

impl Deref for LocationContext {
    type Target = AbstractContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A context carrying an ambient fact about the event (application, path, device...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalContext(AbstractContext);

impl GlobalContext {
    pub fn new(context_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self(AbstractContext::new(context_type, id))
    }

    pub fn with_property(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(self.0.with_property(key, value))
    }

    pub fn as_abstract(&self) -> &AbstractContext {
        &self.0
    }
}

impl Deref for GlobalContext {
    type Target = AbstractContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The unit of context override passed at every composition boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextsConfig {
    pub location_stack: Vec<LocationContext>,
    pub global_contexts: Vec<GlobalContext>,
}

impl ContextsConfig {
    pub fn new(location_stack: Vec<LocationContext>, global_contexts: Vec<GlobalContext>) -> Self {
        Self {
            location_stack,
            global_contexts,
        }
    }

    pub fn with_location(mut self, context: LocationContext) -> Self {
        self.location_stack.push(context);
        self
    }

    pub fn with_global(mut self, context: GlobalContext) -> Self {
        self.global_contexts.push(context);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.location_stack.is_empty() && self.global_contexts.is_empty()
    }
}
