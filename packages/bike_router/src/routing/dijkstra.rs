//! Shortest path search over the routing graph. Edge costs are not stored
//! in the graph, they are requested from the provided cost function each
//! time an edge is relaxed, as they depend on the user's priorities.
//!
//! Where several parallel edges connect the same pair of nodes, the cheapest
//! is used. Ties go to the edge which was added to the graph first, and the
//! edge which was used is recorded against the route.

use petgraph::graph::{EdgeIndex, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::common::error::RoutingError;
use crate::common::graph_data::{BikeGraph, EdgeData, RoutingGraph};

#[derive(Copy, Clone, Debug)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// An ordered walk through the graph. Node IDs are as they appear in the map
/// data, edges holds the index of the edge taken between each consecutive
/// pair of nodes
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<i64>,
    pub edges: Vec<EdgeIndex>,
}

/// All edges leaving a node, in the order they were added to the graph
fn outgoing_edges(
    graph: &BikeGraph,
    node: NodeIndex,
) -> Vec<EdgeReference<'_, EdgeData>> {
    let mut edges: Vec<EdgeReference<EdgeData>> = graph.edges(node).collect();
    edges.sort_by_key(|eref| eref.id());
    edges
}

/// Select the cheapest of the edges running from src to dst, along with its
/// cost. On equal cost the edge added to the graph first is kept
pub fn cheapest_edge<'a, F>(
    graph: &'a BikeGraph,
    src: NodeIndex,
    dst: NodeIndex,
    mut edge_cost: F,
) -> Option<(EdgeReference<'a, EdgeData>, f64)>
where
    F: FnMut(EdgeReference<EdgeData>) -> f64,
{
    let mut candidates: Vec<EdgeReference<EdgeData>> =
        graph.edges_connecting(src, dst).collect();
    candidates.sort_by_key(|eref| eref.id());

    let mut best: Option<(EdgeReference<EdgeData>, f64)> = None;
    for eref in candidates {
        let cost = edge_cost(eref);
        let better = match best {
            Some((_, best_cost)) => cost < best_cost,
            None => true,
        };
        if better {
            best = Some((eref, cost));
        }
    }
    best
}

/// Walk back from the destination to the origin, collecting the nodes and
/// edges which were taken
fn reconstruct_path(
    graph: &BikeGraph,
    came_from: &FxHashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    destination: NodeIndex,
) -> Route {
    let mut nodes = vec![graph[destination].id];
    let mut edges = Vec::new();

    let mut current = destination;
    while let Some(&(prev, edge)) = came_from.get(&current) {
        nodes.push(graph[prev].id);
        edges.push(edge);
        current = prev;
    }

    nodes.reverse();
    edges.reverse();
    Route { nodes, edges }
}

/// Uses Dijkstra's algorithm to find the cheapest route between two nodes,
/// identified by their IDs in the map data. `edge_cost` is called once per
/// edge relaxation, and must never return a negative cost.
///
/// Returns InvalidEndpoint if either node is missing from the graph, and
/// NoPathFound if the destination cannot be reached from the origin.
pub fn find_path<F>(
    graph: &RoutingGraph,
    origin: i64,
    destination: i64,
    mut edge_cost: F,
) -> Result<Route, RoutingError>
where
    F: FnMut(EdgeReference<EdgeData>) -> f64,
{
    let start = graph
        .node_index(origin)
        .ok_or(RoutingError::InvalidEndpoint(origin))?;
    let target = graph
        .node_index(destination)
        .ok_or(RoutingError::InvalidEndpoint(destination))?;

    if start == target {
        return Ok(Route {
            nodes: vec![origin],
            edges: Vec::new(),
        });
    }

    let mut known_costs = FxHashMap::<NodeIndex, f64>::default();
    let mut came_from = FxHashMap::<NodeIndex, (NodeIndex, EdgeIndex)>::default();
    let mut heap = BinaryHeap::new();
    let mut settled: usize = 0;

    known_costs.insert(start, 0.0);
    heap.push(State {
        cost: 0.0,
        node: start,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            log::debug!(
                "Reached node {destination} at cost {cost:.2} after settling \
                 {settled} nodes"
            );
            return Ok(reconstruct_path(&graph.graph, &came_from, target));
        }

        // Skip if we've found a better path
        if let Some(&best) = known_costs.get(&node) {
            if cost > best {
                continue;
            }
        }
        settled += 1;

        for eref in outgoing_edges(&graph.graph, node) {
            let step_cost = edge_cost(eref);
            debug_assert!(step_cost >= 0.0, "negative edge cost {step_cost}");

            let next = eref.target();
            let next_cost = cost + step_cost;

            let improved = match known_costs.get(&next) {
                Some(&known) => next_cost < known,
                None => true,
            };
            if !improved {
                continue;
            }

            known_costs.insert(next, next_cost);
            came_from.insert(next, (node, eref.id()));
            heap.push(State {
                cost: next_cost,
                node: next,
            });
        }
    }

    Err(RoutingError::NoPathFound {
        origin,
        destination,
    })
}
