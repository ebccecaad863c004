//! Error types shared across the package. Routing errors are split between
//! those which are surfaced to the caller (ranking, coordinates, endpoints,
//! reachability)
//! and malformed edge attributes, which are always recovered locally.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Invalid priority ranking: {0}")]
    InvalidRanking(String),
    #[error("One or more coordinates are NaN or infinite")]
    InvalidCoordinates,
    #[error("Node {0} is not present in the graph")]
    InvalidEndpoint(i64),
    #[error("No path found from node {origin} to node {destination}")]
    NoPathFound { origin: i64, destination: i64 },
    #[error("Malformed {attribute} on edge {src} -> {dst}: {value:?}")]
    MalformedEdgeAttribute {
        src: i64,
        dst: i64,
        attribute: &'static str,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid graph data: {0}")]
    Json(#[from] serde_json::Error),
}
