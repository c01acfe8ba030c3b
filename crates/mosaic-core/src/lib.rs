//! mosaic core - in-memory fragment composition kernel
//!
//! This crate holds the state and single-step operations of the engine:
//! - Host tree arena with HTML parsing and serialization (`dom`)
//! - Inclusion graph with cycle detection (`inclusion`)
//! - Include tag validation (`include_tag`)
//! - Fragment compilation, validation and registration (`fragment`)
//! - Placeholder substitution and reactive props/vars (`binder`)
//! - Behavior classes, component registry and lifecycle (`component`)
//! - Structured event bindings (`events`)
//!
//! Orchestration (the resolver loop and boundary logging) lives in
//! `mosaic-engine`.

pub mod binder;
pub mod component;
pub mod config;
pub mod dom;
pub mod errors;
pub mod events;
pub mod fragment;
pub mod include_tag;
pub mod inclusion;
pub mod logging_facility;
pub mod page;

#[doc(hidden)]
pub use mosaic_core_types;

// Re-export commonly used types
pub use component::{Behavior, BehaviorRegistry, ComponentInstance, HookContext};
pub use config::{EngineConfig, FailurePolicy, ReregistrationPolicy, Vocabulary};
pub use dom::{Document, Fragment, NodeId, NodeTree};
pub use errors::{ExError, ExErrorKind, MosaicError, Result};
pub use include_tag::{IncludeDirective, StateMap};
pub use inclusion::InclusionGraph;
pub use page::Page;
