//! Cycle detection over include edges

pub mod graph;

pub use graph::{InclusionGraph, InclusionNode, InclusionNodeId};
