//! Bookkeeping tree of location contexts.
//!
//! Binding layers register every rendered location context together with its parent.
//! The tree is rooted at a synthetic root (a node whose `parent_id` is `None` hangs off
//! it). Each node's location path, the `Type:id` pairs from the root down to the node,
//! must be unique: two different occurrences resolving to the same path would make
//! their events indistinguishable. Collisions are diagnostics, never failures.

use super::contexts::{InstanceId, LocationContext};
use crate::console::{default_console, TrackerConsole};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// A registered location context and the occurrence it is nested in
#[derive(Debug, Clone)]
pub struct LocationNode {
    pub location_context: LocationContext,
    pub parent_id: Option<InstanceId>,
}

impl LocationNode {
    pub fn id(&self) -> InstanceId {
        self.location_context.instance_id()
    }
}

/// Two or more distinct occurrences sharing a location path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCollision {
    pub path: String,
    pub instance_ids: Vec<InstanceId>,
}

pub struct LocationTree {
    nodes: HashMap<InstanceId, LocationNode>,
    // Insertion order, so diagnostics come out deterministically.
    order: Vec<InstanceId>,
    console: Arc<dyn TrackerConsole>,
}

impl LocationTree {
    pub fn new(console: Option<Arc<dyn TrackerConsole>>) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            console: console.unwrap_or_else(default_console),
        }
    }

    /// Registers `context` under `parent` (or under the root when `parent` is `None`).
    ///
    /// Registering the same occurrence twice is a no-op. A parent that was never
    /// registered is reported and the node is not added.
    pub fn add(&mut self, context: &LocationContext, parent: Option<&LocationContext>) {
        let id = context.instance_id();
        if self.nodes.contains_key(&id) {
            return;
        }

        let parent_id = parent.map(|p| p.instance_id());
        if let Some(parent_id) = parent_id {
            if !self.nodes.contains_key(&parent_id) {
                self.console.error(&format!(
                    "LocationTree: cannot add {}:{}, parent occurrence {} is not in the tree.",
                    context.context_type(),
                    context.id(),
                    parent_id
                ));
                return;
            }
        }

        self.nodes.insert(
            id,
            LocationNode {
                location_context: context.clone(),
                parent_id,
            },
        );
        self.order.push(id);
    }

    /// Removes an occurrence and everything nested under it.
    pub fn remove(&mut self, context: &LocationContext) {
        let mut doomed: HashSet<InstanceId> = HashSet::new();
        doomed.insert(context.instance_id());

        // Children always come after their parent in insertion order.
        for id in &self.order {
            if let Some(parent_id) = self.nodes.get(id).and_then(|n| n.parent_id) {
                if doomed.contains(&parent_id) {
                    doomed.insert(*id);
                }
            }
        }

        self.nodes.retain(|id, _| !doomed.contains(id));
        self.order.retain(|id| !doomed.contains(id));
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: InstanceId) -> Option<&LocationNode> {
        self.nodes.get(&id)
    }

    /// The location stack from the root down to `id`, inclusive.
    pub fn location_stack(&self, id: InstanceId) -> Option<Vec<LocationContext>> {
        let mut stack = Vec::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            let node = self.nodes.get(&node_id)?;
            stack.push(node.location_context.clone());
            if stack.len() > self.nodes.len() {
                return None;
            }
            current = node.parent_id;
        }

        stack.reverse();
        Some(stack)
    }

    /// Printable location path of `id`, e.g. `RootLocationContext:home / LinkContext:docs`.
    pub fn location_path(&self, id: InstanceId) -> Option<String> {
        self.location_stack(id).map(|stack| {
            stack
                .iter()
                .map(|c| format!("{}:{}", c.context_type(), c.id()))
                .collect::<Vec<_>>()
                .join(" / ")
        })
    }

    /// Finds distinct occurrences that resolve to the same location path.
    ///
    /// Each collision is reported once to the console.
    pub fn validate(&self) -> Vec<LocationCollision> {
        let mut by_path: BTreeMap<String, Vec<InstanceId>> = BTreeMap::new();
        let mut first_seen: Vec<String> = Vec::new();

        for id in &self.order {
            if let Some(path) = self.location_path(*id) {
                let entry = by_path.entry(path.clone()).or_default();
                if entry.is_empty() {
                    first_seen.push(path);
                }
                entry.push(*id);
            }
        }

        let collisions: Vec<LocationCollision> = first_seen
            .into_iter()
            .filter_map(|path| {
                let ids = by_path.remove(&path)?;
                (ids.len() > 1).then_some(LocationCollision {
                    path,
                    instance_ids: ids,
                })
            })
            .collect();

        for collision in &collisions {
            self.console.error(&format!(
                "Location collision detected: {} occurrences share the path `{}`.",
                collision.instance_ids.len(),
                collision.path
            ));
        }

        collisions
    }
}

impl Default for LocationTree {
    fn default() -> Self {
        Self::new(None)
    }
}
