//! The route cost engine. Priorities are normalized into weights, which
//! drive the per-edge cost used by the shortest path search, and the
//! resulting path is summarized for display.

pub mod cost;
pub mod dijkstra;
pub mod engine;
pub mod priorities;
pub mod summary;
