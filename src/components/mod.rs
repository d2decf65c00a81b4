//! UI components.

pub mod process_graph;
