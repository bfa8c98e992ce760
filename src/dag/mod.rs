// src/dag/mod.rs

//! Path graph and staleness analysis.
//!
//! - [`paths`] holds lexical normalization helpers.
//! - [`node`] is one canonical path plus its dependency keys.
//! - [`graph`] owns every node and enforces acyclicity.
//! - [`staleness`] walks closures and decides what must rebuild.

pub mod graph;
pub mod node;
pub mod paths;
pub mod staleness;

pub use graph::DependencyGraph;
pub use node::Node;
pub use staleness::{requires_build, transitive_dependencies};
