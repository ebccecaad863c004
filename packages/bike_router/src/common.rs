//! Shared data structures, configuration and errors used throughout the
//! rest of the package.

pub mod bbox;
pub mod config;
pub mod error;
pub mod graph_data;
