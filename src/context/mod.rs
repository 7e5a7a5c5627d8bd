//! Context model and composition.
//!
//! This module provides the immutable context value objects, the merge rules used at
//! every composition boundary, structural equality, taxonomy names and the auxiliary
//! location tree used by binding layers.

pub mod contexts;
pub mod equality;
pub mod location_tree;
pub mod merge;
pub mod taxonomy;

pub use contexts::{AbstractContext, ContextsConfig, GlobalContext, InstanceId, LocationContext};
pub use equality::{is_context, is_context_equal};
pub use location_tree::{LocationCollision, LocationNode, LocationTree};
pub use merge::merge_contexts;
