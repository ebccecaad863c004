use rayon::prelude::*;
use serde::Serialize;

use crate::common::bbox::BBox;
use crate::common::config::{PriorityRanking, RouteRequestConfig};
use crate::common::error::RoutingError;
use crate::common::graph_data::RoutingGraph;
use crate::loading::petgraph::find_nearest_node;
use crate::routing::cost::graph_edge_cost;
use crate::routing::dijkstra::find_path;
use crate::routing::priorities::{WeightVector, normalize};
use crate::routing::summary::{RouteSummary, route_bbox, summarize};

/// A single routing request between two nodes of the graph
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: i64,
    pub destination: i64,
    pub ranking: PriorityRanking,
}

impl RouteRequest {
    /// Snap the requested start and end points onto the closest nodes in
    /// the graph. Returns None if the graph has no nodes
    pub fn resolve(
        graph: &RoutingGraph,
        config: RouteRequestConfig,
    ) -> Option<RouteRequest> {
        let origin = find_nearest_node(graph, config.origin)?;
        let destination = find_nearest_node(graph, config.destination)?;

        Some(RouteRequest {
            origin,
            destination,
            ranking: config.ranking,
        })
    }
}

/// Everything required to present a completed route. The bounding box and
/// its centre set the viewport of the map showing the route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRoute {
    pub nodes: Vec<i64>,
    pub weights: WeightVector,
    pub summary: RouteSummary,
    pub bbox: Option<BBox>,
    pub centre: Option<(f64, f64)>,
}

/// Find the cheapest route for a single request. The user's ranking is
/// normalized into weights, which drive both the search and the summary
pub fn plan_route(
    graph: &RoutingGraph,
    request: &RouteRequest,
) -> Result<PlannedRoute, RoutingError> {
    let weights = normalize(&request.ranking)?;
    log::info!(
        "Routing from {} to {} with weights {}",
        request.origin,
        request.destination,
        weights
    );

    let route =
        find_path(graph, request.origin, request.destination, |eref| {
            graph_edge_cost(&graph.graph, eref, &weights)
        })?;

    let summary = summarize(graph, &route, &weights);
    log::info!(
        "Route of {} nodes, {:.0}m in {:.1} minutes",
        route.nodes.len(),
        summary.distance,
        summary.time_min
    );

    let bbox = route_bbox(graph, &route);

    Ok(PlannedRoute {
        bbox,
        centre: bbox.map(|bbox| bbox.get_centre()),
        nodes: route.nodes,
        weights,
        summary,
    })
}

/// Process a batch of requests, using Rayon to distribute processing. The
/// graph is only ever read, so every request shares the same instance.
/// Results are returned in the same order as the requests
pub fn plan_routes(
    graph: &RoutingGraph,
    requests: &[RouteRequest],
) -> Vec<Result<PlannedRoute, RoutingError>> {
    let mut results = Vec::with_capacity(requests.len());

    requests
        .par_iter()
        .map(|request| plan_route(graph, request))
        .collect_into_vec(&mut results);

    results
}
