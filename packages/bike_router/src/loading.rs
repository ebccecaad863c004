//! This module focuses on reading node and edge rows and using them to
//! generate a petgraph graph object.

pub mod petgraph;
pub mod rows;
