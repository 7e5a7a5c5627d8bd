//! Plugin pipeline.
//!
//! Plugins hook into the lifecycle of every tracked event:
//!
//! 1. `initialize` once, when the owning tracker is built;
//! 2. `validate` on the composed event;
//! 3. `enrich` on the event's contexts;
//! 4. `before_transport` on the finalized event.
//!
//! # Built-in plugins
//!
//! - [`ApplicationContextPlugin`] - adds the ApplicationContext (installed by default)
//! - [`PathContextPlugin`] - adds a PathContext from an injected provider
//! - [`OpenTaxonomyValidationPlugin`] - reports taxonomy rule violations

pub mod application_context;
pub mod collection;
pub mod open_taxonomy_validation;
pub mod path_context;
pub mod plugin;

pub use application_context::{ApplicationContextPlugin, APPLICATION_CONTEXT_PLUGIN};
pub use collection::TrackerPlugins;
pub use open_taxonomy_validation::{
    validate_taxonomy, ContextScope, OpenTaxonomyValidationPlugin, TaxonomyViolation,
    ViolationKind, OPEN_TAXONOMY_VALIDATION_PLUGIN,
};
pub use path_context::{PathContextPlugin, PathProvider, PATH_CONTEXT_PLUGIN};
pub use plugin::TrackerPlugin;
