//! Core types shared across the mosaic crates
//!
//! This crate provides foundational types used by both the error and
//! logging facilities:
//!
//! - **Correlation types**: PassId for tagging one resolution pass
//! - **Schema constants**: field keys and event names of boundary logs

pub mod correlation;
pub mod schema;

pub use correlation::PassId;
