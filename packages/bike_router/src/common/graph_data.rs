//! Defines the data which is stored against each node and edge of the
//! routing graph. Every attribute which may be missing from the source map
//! data has a documented default, set as a named constant in this module.

use geo::Point;
use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Travel speed used to estimate travel time when an edge carries none, in
/// metres per second
pub const FALLBACK_TRAVEL_SPEED: f64 = 5.0;

/// Cycling speed used to derive travel times while building the graph,
/// 15 km/h expressed in metres per second
pub const BIKE_SPEED_M_S: f64 = 15.0 / 3.6;

/// Label used in directions for edges without a street name
pub const UNNAMED_ROAD: &str = "Unnamed Road";

/// Traffic control present at a node, derived from the OSM highway tag
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrafficControl {
    #[default]
    None,
    Signal,
    Stop,
}

impl TrafficControl {
    /// Interpret the highway tag of a node. Anything other than a traffic
    /// signal or a stop sign carries no control
    pub fn from_highway_tag(tag: Option<&str>) -> TrafficControl {
        match tag {
            Some("traffic_signals") => TrafficControl::Signal,
            Some("stop") => TrafficControl::Stop,
            _ => TrafficControl::None,
        }
    }
}

/// Sets the data which will be stored as weights in the petgraph graph.
/// Coordinates are projected, in metres
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeData {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub control: TrafficControl,
}

impl NodeData {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_traffic_signal(&self) -> bool {
        self.control == TrafficControl::Signal
    }

    pub fn is_stop_sign(&self) -> bool {
        self.control == TrafficControl::Stop
    }
}

/// The raw cycleway tags of an edge, as they appear in the OSM data
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct CyclewayTags {
    pub cycleway: Option<String>,
    pub right: Option<String>,
    pub left: Option<String>,
    pub both: Option<String>,
}

impl CyclewayTags {
    /// All tags which are present, in order of precedence
    pub fn present(&self) -> impl Iterator<Item = &str> {
        [&self.cycleway, &self.right, &self.left, &self.both]
            .into_iter()
            .filter_map(|tag| tag.as_deref())
    }
}

/// Container for edge metadata which will be stored in the graph. Several
/// edges may connect the same pair of nodes, each keeps its own attributes
#[derive(Default, Debug, Clone, PartialEq, Serialize)]
pub struct EdgeData {
    pub src: i64,
    pub dst: i64,
    pub length: f64,
    pub maxspeed: Option<String>,
    pub surface: Option<String>,
    pub highway: String,
    pub cycleway: CyclewayTags,
    pub name: Option<String>,
    pub travel_time: Option<f64>,
}

impl EdgeData {
    /// Travel time in seconds. When the edge has none, this is approximated
    /// from the length at FALLBACK_TRAVEL_SPEED
    pub fn travel_time_or_estimate(&self) -> f64 {
        match self.travel_time {
            Some(time) => time,
            None => self.length / FALLBACK_TRAVEL_SPEED,
        }
    }

    /// Street name to be used in directions
    pub fn street_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED_ROAD,
        }
    }
}

/// The directed multigraph which routes are found over
pub type BikeGraph = Graph<NodeData, EdgeData, Directed, u32>;

/// A routing graph along with a mapping from the node IDs used in the map
/// data to their indices in the graph. Once created this is never mutated,
/// so it can be shared between any number of concurrent requests
#[derive(Debug, Clone, Default)]
pub struct RoutingGraph {
    pub graph: BikeGraph,
    index: FxHashMap<i64, NodeIndex>,
}

impl RoutingGraph {
    pub fn new(graph: BikeGraph, index: FxHashMap<i64, NodeIndex>) -> Self {
        RoutingGraph { graph, index }
    }

    /// Look up the graph index for a node ID from the map data
    pub fn node_index(&self, id: i64) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, id: i64) -> Option<&NodeData> {
        self.node_index(id)
            .and_then(|inx| self.graph.node_weight(inx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
