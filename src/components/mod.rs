//! Reusable view components.

pub mod relationship_graph;
