//! Storage backend traits.

pub mod graph;

pub use graph::{GraphSession, GraphStore};
