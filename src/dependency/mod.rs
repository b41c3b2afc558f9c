//! Dependency ordering for tables and views
//!
//! An edge `a → b` means "a depends on b": b must exist before a is created,
//! and a must be gone before b is dropped. [`DependencyGraph`] collects edges
//! and [`DependencyGraph::finalize`] freezes it into a [`FinalizedGraph`] that
//! answers the four ordering queries.

pub mod graph;
pub mod store;

pub use graph::{DependencyGraph, FinalizedGraph};
pub use store::TargetStore;
