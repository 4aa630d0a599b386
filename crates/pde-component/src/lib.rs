//! The hierarchical, dynamically-typed component tree: named nodes with
//! parent/child ownership, URI access, typed options with triggers, typed
//! properties, tags, and named signals.
//!
//! Components own their children exclusively; references to other
//! components go through [`pde_handle::Handle`] ([`ComponentId`]), which
//! observably expires once its referent is destroyed.

mod error;
mod options;
mod properties;
mod signal;
mod tree;

pub use error::ComponentError;
pub use options::{Option_, OptionList, Value};
pub use properties::PropertyList;
pub use signal::{Signal, SignalRegistry};
pub use tree::{ComponentId, ComponentTree, Factory, Node};
