use crate::common::graph_data::{
    BIKE_SPEED_M_S, BikeGraph, EdgeData, NodeData, RoutingGraph,
};
use crate::loading::rows::{EdgeRow, GraphRows, NodeRow};
use geo::{Distance, Euclidean, Point};
use petgraph::graph::NodeIndex;
use petgraph::visit::IntoNodeReferences;
use rustc_hash::{FxHashMap, FxHashSet};

/// Nodes in the graph need to have associated coordinate data. To achieve
/// this, we create a mapping for source IDs as they appear in the OSM data to
/// NodeData structs. Edges must also be provided here, as we only want to add
/// the nodes which are used in one of the edges.
pub fn generate_node_map(
    nodes: Vec<NodeRow>,
    edges: &[EdgeRow],
) -> FxHashMap<i64, NodeData> {
    let mut node_map = FxHashMap::<i64, NodeData>::default();
    let mut used_nodes = FxHashSet::<i64>::default();

    for edge in edges {
        used_nodes.insert(edge.src);
        used_nodes.insert(edge.dst);
    }

    for node in nodes {
        if used_nodes.contains(&node.id) {
            node_map.insert(node.id, node.into());
        }
    }

    node_map
}

/// Make sure that the length of an edge is usable for routing, and derive
/// a cycling travel time where none was provided. Lengths which are negative
/// or not finite are replaced with zero
fn prepare_edge(mut edge: EdgeData) -> EdgeData {
    if !edge.length.is_finite() || edge.length < 0.0 {
        log::warn!(
            "Edge {} -> {} has invalid length {}, using 0",
            edge.src,
            edge.dst,
            edge.length
        );
        edge.length = 0.0;
    }

    if let Some(time) = edge.travel_time.filter(|t| !t.is_finite() || *t < 0.0)
    {
        log::warn!(
            "Edge {} -> {} has invalid travel time {time}, deriving it",
            edge.src,
            edge.dst
        );
        edge.travel_time = None;
    }

    if edge.travel_time.is_none() && edge.length > 0.0 {
        edge.travel_time = Some(edge.length / BIKE_SPEED_M_S);
    }

    edge
}

/// Based on the rows which have been loaded in, generate a petgraph graph
/// which can be used for route plotting. Parallel edges between the same
/// pair of nodes are all retained, in the order they were provided
pub fn create_graph(rows: GraphRows) -> RoutingGraph {
    let GraphRows { nodes, edges } = rows;

    // Set up empty graph
    let mut graph = BikeGraph::new();

    // Unpack node data
    let node_weights_by_id = generate_node_map(nodes, &edges);

    // Sorting by ID keeps node indices stable between loads of the same data
    let mut node_ids: Vec<i64> = node_weights_by_id.keys().copied().collect();
    node_ids.sort_unstable();

    let mut node_id_inx_map = FxHashMap::<i64, NodeIndex>::default();
    for id in node_ids {
        let node_inx = graph.add_node(node_weights_by_id[&id]);
        node_id_inx_map.insert(id, node_inx);
    }

    let mut skipped = 0;
    for edge in edges {
        let edge_data = prepare_edge(edge.into());

        // Fetch indexes for src and dst as they appear in the graph
        let (src_inx, dst_inx) = match (
            node_id_inx_map.get(&edge_data.src),
            node_id_inx_map.get(&edge_data.dst),
        ) {
            (Some(src_inx), Some(dst_inx)) => (*src_inx, *dst_inx),
            _ => {
                skipped += 1;
                continue;
            }
        };

        graph.add_edge(src_inx, dst_inx, edge_data);
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} edges referencing unknown nodes");
    }

    log::info!(
        "Created graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    RoutingGraph::new(graph, node_id_inx_map)
}

/// Determine the closest node to the provided point, using the straight line
/// distance in the projected coordinate system. Returns None for an empty
/// graph. Ties are resolved in favour of the node added first
pub fn find_nearest_node(graph: &RoutingGraph, point: Point) -> Option<i64> {
    let mut smallest_dist = f64::MAX;
    let mut closest_id: Option<i64> = None;

    for (_, node_weight) in graph.graph.node_references() {
        let dist = Euclidean::distance(point, node_weight.point());

        if dist < smallest_dist {
            smallest_dist = dist;
            closest_id = Some(node_weight.id);
        }
    }

    closest_id
}
