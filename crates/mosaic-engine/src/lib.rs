//! mosaic engine - orchestration layer
//!
//! Wraps the `mosaic-core` kernel in an [`EngineContext`] and drives include
//! resolution over an asynchronous [`FragmentLoader`]. All boundary logging
//! (`start`/`end`/`end_error` events) is emitted from here.

pub mod context;
pub mod loader;
pub mod resolver;

pub use context::EngineContext;
pub use loader::{FragmentLoader, FsLoader, StaticLoader};
pub use resolver::{ResolutionReport, TagFailure};
