//! The functions defined here can be used to read in details of all of the
//! nodes and edges required to represent a map of the area being routed
//! over. Rows are provided by whichever collaborator downloads and projects
//! the map data, as a single JSON document.
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::common::error::LoadError;
use crate::common::graph_data::{
    CyclewayTags, EdgeData, NodeData, TrafficControl,
};

/// OSM tags may be exported as a plain value, or as a list when several
/// ways were merged into a single edge
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawTag {
    Text(String),
    Number(f64),
    List(Vec<RawTag>),
}

impl RawTag {
    /// Flatten the tag into a single string. Lists keep every value,
    /// separated by semicolons as in OSM multi-value tags
    pub fn flatten(self) -> String {
        match self {
            RawTag::Text(text) => text,
            RawTag::Number(num) => num.to_string(),
            RawTag::List(items) => items
                .into_iter()
                .map(RawTag::flatten)
                .collect::<Vec<String>>()
                .join(";"),
        }
    }

    /// Retrieve the first value of the tag
    pub fn first(self) -> Option<String> {
        match self {
            RawTag::List(items) => items.into_iter().next()?.first(),
            other => Some(other.flatten()),
        }
    }
}

/// Container for a single node, as it appears in the graph rows
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id: i64,
    x: f64,
    y: f64,
    #[serde(default)]
    highway: Option<RawTag>,
}

impl From<NodeRow> for NodeData {
    fn from(row: NodeRow) -> NodeData {
        NodeData {
            id: row.id,
            x: row.x,
            y: row.y,
            control: TrafficControl::from_highway_tag(
                row.highway.and_then(RawTag::first).as_deref(),
            ),
        }
    }
}

/// Container for a single edge, as it appears in the graph rows. Only src
/// and dst are required, every other attribute has a default. Tags which
/// may hold several values are kept whole, joined by semicolons, and the
/// cost model reads each value. Only the name keeps just its first value
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub src: i64,
    pub dst: i64,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    maxspeed: Option<RawTag>,
    #[serde(default)]
    surface: Option<RawTag>,
    #[serde(default)]
    highway: Option<RawTag>,
    #[serde(default)]
    cycleway: Option<RawTag>,
    #[serde(default, rename = "cycleway:right")]
    cycleway_right: Option<RawTag>,
    #[serde(default, rename = "cycleway:left")]
    cycleway_left: Option<RawTag>,
    #[serde(default, rename = "cycleway:both")]
    cycleway_both: Option<RawTag>,
    #[serde(default)]
    name: Option<RawTag>,
    #[serde(default)]
    travel_time: Option<f64>,
}

impl From<EdgeRow> for EdgeData {
    /// Unpack the raw edge data into a format which can be loaded into the
    /// graph. Lengths are checked when the graph is created
    fn from(row: EdgeRow) -> EdgeData {
        EdgeData {
            src: row.src,
            dst: row.dst,
            length: row.length.unwrap_or(0.0),
            maxspeed: row.maxspeed.map(RawTag::flatten),
            surface: row.surface.map(RawTag::flatten),
            highway: row.highway.map(RawTag::flatten).unwrap_or_default(),
            cycleway: CyclewayTags {
                cycleway: row.cycleway.map(RawTag::flatten),
                right: row.cycleway_right.map(RawTag::flatten),
                left: row.cycleway_left.map(RawTag::flatten),
                both: row.cycleway_both.map(RawTag::flatten),
            },
            name: row.name.and_then(RawTag::first),
            travel_time: row.travel_time,
        }
    }
}

/// All of the rows required to build a graph
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GraphRows {
    pub nodes: Vec<NodeRow>,
    pub edges: Vec<EdgeRow>,
}

/// Parse graph rows from a JSON string
pub fn parse_rows(raw: &str) -> Result<GraphRows, LoadError> {
    let rows: GraphRows = serde_json::from_str(raw)?;
    log::info!(
        "Parsed {} node rows and {} edge rows",
        rows.nodes.len(),
        rows.edges.len()
    );
    Ok(rows)
}

/// Read graph rows from a JSON file on disk
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<GraphRows, LoadError> {
    let raw = fs::read_to_string(path.as_ref())?;
    parse_rows(&raw)
}
