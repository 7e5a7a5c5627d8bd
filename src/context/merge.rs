//! Context composition across nested scopes.
//!
//! Location stacks and global contexts are merged with opposite precedence:
//!
//! - location stacks concatenate in the order the configs are supplied (outermost
//!   scope first) and the event's own stack is appended last, so the most specific
//!   location ends up at the end of the stack;
//! - global contexts start with the event's own contexts and the supplied configs are
//!   appended in order, so the most specific facts come first.
//!
//! No deduplication happens here; duplicated `(type, id)` pairs are reported by
//! taxonomy validation instead.

use super::contexts::ContextsConfig;

/// Merges `configs` (outermost first) with the event's `own` contexts.
pub fn merge_contexts(configs: &[ContextsConfig], own: &ContextsConfig) -> ContextsConfig {
    let location_stack = configs
        .iter()
        .flat_map(|config| config.location_stack.iter())
        .chain(own.location_stack.iter())
        .cloned()
        .collect();

    let global_contexts = own
        .global_contexts
        .iter()
        .chain(configs.iter().flat_map(|config| config.global_contexts.iter()))
        .cloned()
        .collect();

    ContextsConfig {
        location_stack,
        global_contexts,
    }
}
