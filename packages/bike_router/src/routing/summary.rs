//! Defines the high level information about a completed route (i.e. total
//! distance, time spent, bike lane coverage and directions)

use geo::Point;
use serde::Serialize;

use crate::common::bbox::{BBox, ROUTE_BBOX_MARGIN};
use crate::common::graph_data::{EdgeData, RoutingGraph};
use crate::routing::cost::{CycleInfra, graph_edge_cost};
use crate::routing::dijkstra::{Route, cheapest_edge};
use crate::routing::priorities::WeightVector;

/// Container for the overall metrics of a completed route. Distance is in
/// metres and time in seconds, with time also given in minutes for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance: f64,
    pub time: f64,
    pub time_min: f64,
    pub bike_lane_segments: usize,
    pub protected_segments: usize,
    pub directions: Vec<String>,
}

impl RouteSummary {
    /// Update the metrics to reflect their state after traversing the
    /// provided edge
    fn take_step(&mut self, edata: &EdgeData) {
        self.distance += edata.length;
        self.time += edata.travel_time_or_estimate();

        let infra = CycleInfra::classify(edata);
        if infra.has_lane() {
            self.bike_lane_segments += 1;
        }
        if infra.has_track() {
            self.protected_segments += 1;
        }
    }
}

/// Turn the street names along a route into directions, with one
/// instruction each time the name changes
pub fn get_route_directions<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut directions = Vec::new();
    let mut prev_street: Option<&str> = None;

    for street in names {
        if prev_street != Some(street) {
            directions.push(format!("Continue on {street}"));
            prev_street = Some(street);
        }
    }

    directions
}

/// Summarize a route found over the provided graph. Between each pair of
/// nodes the cheapest edge under `weights` is used, which is the same edge
/// the search itself would have taken. Pairs with no connecting edge are
/// skipped
pub fn summarize(
    graph: &RoutingGraph,
    route: &Route,
    weights: &WeightVector,
) -> RouteSummary {
    let mut summary = RouteSummary::default();
    let mut names: Vec<&str> = Vec::new();

    for pair in route.nodes.windows(2) {
        let edge = match (graph.node_index(pair[0]), graph.node_index(pair[1]))
        {
            (Some(src), Some(dst)) => {
                cheapest_edge(&graph.graph, src, dst, |eref| {
                    graph_edge_cost(&graph.graph, eref, weights)
                })
            }
            _ => None,
        };

        match edge {
            Some((eref, _)) => {
                let edata = eref.weight();
                summary.take_step(edata);
                names.push(edata.street_name());
            }
            None => {
                log::warn!("No edge from {} to {}, skipping", pair[0], pair[1])
            }
        }
    }

    summary.time_min = summary.time / 60.0;
    summary.directions = get_route_directions(names);
    summary
}

/// Determine the area which should be shown when displaying the route,
/// including a margin around its nodes
pub fn route_bbox(graph: &RoutingGraph, route: &Route) -> Option<BBox> {
    let points: Vec<Point> = route
        .nodes
        .iter()
        .filter_map(|id| graph.node(*id))
        .map(|node| node.point())
        .collect();

    BBox::enclosing(&points).map(|bbox| bbox.with_margin(ROUTE_BBOX_MARGIN))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::common::config::Factor;
    use crate::common::graph_data::{BikeGraph, CyclewayTags, NodeData};
    use approx::assert_relative_eq;
    use rustc_hash::FxHashMap;

    /// Edge attributes for the test graph: src, dst, length, cycleway tag,
    /// street name
    type TestEdge = (i64, i64, f64, Option<&'static str>, Option<&'static str>);

    fn get_test_graph(edges: &[TestEdge]) -> RoutingGraph {
        let mut graph = BikeGraph::new();
        let mut index = FxHashMap::default();

        for (src, dst, length, cycleway, name) in edges {
            for id in [*src, *dst] {
                index.entry(id).or_insert_with(|| {
                    graph.add_node(NodeData {
                        id,
                        x: id as f64 * 100.0,
                        y: 0.0,
                        ..Default::default()
                    })
                });
            }

            graph.add_edge(
                index[src],
                index[dst],
                EdgeData {
                    src: *src,
                    dst: *dst,
                    length: *length,
                    cycleway: CyclewayTags {
                        cycleway: cycleway.map(str::to_string),
                        ..Default::default()
                    },
                    name: name.map(str::to_string),
                    travel_time: Some(length / 4.0),
                    ..Default::default()
                },
            );
        }

        RoutingGraph::new(graph, index)
    }

    fn get_route(nodes: Vec<i64>) -> Route {
        Route {
            nodes,
            edges: Vec::new(),
        }
    }

    /// Consecutive edges on the same street collapse into one instruction
    #[test]
    fn test_directions_collapse() {
        let result = get_route_directions(["Foothill", "Foothill", "Higuera"]);

        assert_eq!(result, vec!["Continue on Foothill", "Continue on Higuera"]);
    }

    /// Returning to a previous street produces a new instruction
    #[test]
    fn test_directions_repeat_street() {
        let result = get_route_directions(["A", "B", "A"]);

        assert_eq!(result.len(), 3);
    }

    /// Totals, lane counts and directions are gathered along the route
    #[test]
    fn test_summarize() {
        let graph = get_test_graph(&[
            (1, 2, 100.0, None, Some("Foothill")),
            (2, 3, 50.0, Some("lane"), Some("Foothill")),
            (3, 4, 20.0, Some("track"), Some("Higuera")),
            (4, 5, 10.0, None, None),
        ]);
        let route = get_route(vec![1, 2, 3, 4, 5]);

        let result = summarize(&graph, &route, &WeightVector::time_only());

        assert_relative_eq!(result.distance, 180.0);
        assert_relative_eq!(result.time, 45.0);
        assert_relative_eq!(result.time_min, 0.75);
        assert_eq!(result.bike_lane_segments, 2);
        assert_eq!(result.protected_segments, 1);
        assert_eq!(
            result.directions,
            vec![
                "Continue on Foothill",
                "Continue on Higuera",
                "Continue on Unnamed Road"
            ]
        );
    }

    /// The parallel edge picked is the cheapest under the given weights
    #[test]
    fn test_summarize_parallel_edges() {
        let graph = get_test_graph(&[
            (1, 2, 100.0, None, Some("Main Road")),
            (1, 2, 120.0, Some("track"), Some("Side Path")),
        ]);
        let route = get_route(vec![1, 2]);

        let by_distance = summarize(
            &graph,
            &route,
            &WeightVector::only(Factor::Distance),
        );
        let by_protection = summarize(
            &graph,
            &route,
            &WeightVector::only(Factor::FindProtectedBikeLane),
        );

        assert_relative_eq!(by_distance.distance, 100.0);
        assert_eq!(by_distance.directions, vec!["Continue on Main Road"]);
        assert_relative_eq!(by_protection.distance, 120.0);
        assert_eq!(by_protection.protected_segments, 1);
    }

    /// Node pairs without an edge are skipped rather than failing
    #[test]
    fn test_summarize_missing_edge() {
        let graph = get_test_graph(&[
            (1, 2, 100.0, None, Some("Foothill")),
            (3, 4, 10.0, None, Some("Higuera")),
        ]);
        let route = get_route(vec![1, 2, 3, 4]);

        let result = summarize(&graph, &route, &WeightVector::time_only());

        assert_relative_eq!(result.distance, 110.0);
        assert_eq!(result.directions.len(), 2);
    }

    /// A single node route has nothing to summarize
    #[test]
    fn test_summarize_single_node() {
        let graph = get_test_graph(&[(1, 2, 100.0, None, Some("Foothill"))]);
        let route = get_route(vec![1]);

        let result = summarize(&graph, &route, &WeightVector::time_only());

        assert_eq!(result, RouteSummary::default());
    }

    /// The display area covers all nodes plus the margin
    #[test]
    fn test_route_bbox() {
        let graph = get_test_graph(&[
            (1, 2, 100.0, None, None),
            (2, 3, 100.0, None, None),
        ]);
        let route = get_route(vec![1, 2, 3]);

        let result = route_bbox(&graph, &route).unwrap();

        assert_relative_eq!(result.min_x, 100.0 - ROUTE_BBOX_MARGIN);
        assert_relative_eq!(result.max_x, 300.0 + ROUTE_BBOX_MARGIN);
        assert_relative_eq!(result.min_y, -ROUTE_BBOX_MARGIN);
        assert_relative_eq!(result.max_y, ROUTE_BBOX_MARGIN);
    }
}
