//! The edge cost model. Each edge is reduced to a handful of independent
//! features (infrastructure, speed, surface, traffic controls, length and
//! time), which are then combined linearly under the user's weights.
//!
//! Cycling infrastructure is rewarded by penalising its absence in
//! proportion to the edge length, so every term is non-negative and so is
//! the total cost.

use petgraph::graph::EdgeReference;
use petgraph::visit::EdgeRef;

use crate::common::config::Factor;
use crate::common::error::RoutingError;
use crate::common::graph_data::{BikeGraph, EdgeData, NodeData};
use crate::routing::priorities::WeightVector;

/// Speed limit assumed when an edge declares none, or an unusable one
pub const DEFAULT_SPEED_LIMIT: f64 = 30.0;

/// Speed limits are divided by this to give the speed penalty
pub const REFERENCE_SPEED: f64 = 50.0;

/// Penalty per traffic signal at either end of an edge
pub const SIGNAL_WEIGHT: f64 = 0.5;

/// Penalty per stop sign at either end of an edge
pub const STOP_WEIGHT: f64 = 0.2;

/// Surfaces which are never penalised. Edges with no surface tag are also
/// left alone, only explicitly unpaved surfaces count against an edge
const PAVED_SURFACES: [&str; 2] = ["asphalt", "paved"];

/// Split a tag into its non-empty values. Merged edges carry several values
/// separated by semicolons
fn tag_values(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(';').map(str::trim).filter(|value| !value.is_empty())
}

/// Classification of the cycling infrastructure along an edge, from least
/// to most separated from traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CycleInfra {
    None,
    SharedLane,
    OppositeLane,
    Lane,
    Track,
    DedicatedWay,
}

impl CycleInfra {
    /// Interpret the value of a single cycleway tag
    pub fn from_cycleway_tag(tag: &str) -> CycleInfra {
        match tag.trim() {
            "track" | "opposite_track" => CycleInfra::Track,
            "lane" => CycleInfra::Lane,
            "opposite_lane" => CycleInfra::OppositeLane,
            "shared_lane" | "share_busway" => CycleInfra::SharedLane,
            _ => CycleInfra::None,
        }
    }

    /// Classify an edge based on all of its cycleway tags and its highway
    /// type, keeping the most separated class found
    pub fn classify(edge: &EdgeData) -> CycleInfra {
        let dedicated = match tag_values(&edge.highway).any(|h| h == "cycleway")
        {
            true => CycleInfra::DedicatedWay,
            false => CycleInfra::None,
        };

        edge.cycleway
            .present()
            .flat_map(tag_values)
            .map(CycleInfra::from_cycleway_tag)
            .fold(dedicated, CycleInfra::max)
    }

    pub fn has_lane(self) -> bool {
        self != CycleInfra::None
    }

    pub fn has_track(self) -> bool {
        matches!(self, CycleInfra::Track | CycleInfra::DedicatedWay)
    }
}

/// Read the declared speed limit of an edge. Missing limits give the
/// default, while values which cannot be read are reported as a
/// MalformedEdgeAttribute. Multi-valued tags use their first value, and
/// a trailing unit is ignored
pub fn parse_speed_limit(edge: &EdgeData) -> Result<f64, RoutingError> {
    let raw = match edge.maxspeed.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(DEFAULT_SPEED_LIMIT),
    };

    let malformed = || RoutingError::MalformedEdgeAttribute {
        src: edge.src,
        dst: edge.dst,
        attribute: "maxspeed",
        value: raw.to_string(),
    };

    let first = raw.split(';').next().unwrap_or_default().trim();
    let number = first
        .trim_end_matches("mph")
        .trim_end_matches("km/h")
        .trim_end_matches("kmh")
        .trim();

    match number.parse::<f64>() {
        Ok(speed) if speed.is_finite() && speed >= 0.0 => Ok(speed),
        _ => Err(malformed()),
    }
}

/// All of the features of a single edge which contribute to its cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFeatures {
    pub length: f64,
    pub travel_time: f64,
    pub infra: CycleInfra,
    pub speed_penalty: f64,
    pub surface_penalty: f64,
    pub signals: u32,
    pub stops: u32,
}

impl EdgeFeatures {
    pub fn extract(
        edge: &EdgeData,
        from: &NodeData,
        to: &NodeData,
    ) -> EdgeFeatures {
        let speed = parse_speed_limit(edge).unwrap_or_else(|err| {
            log::debug!("{err}, using {DEFAULT_SPEED_LIMIT}");
            DEFAULT_SPEED_LIMIT
        });

        let unpaved = edge.surface.as_deref().is_some_and(|surface| {
            tag_values(surface).any(|value| {
                !PAVED_SURFACES.contains(&value.to_lowercase().as_str())
            })
        });
        let surface_penalty = if unpaved { 1.0 } else { 0.0 };

        let endpoints = [from, to];

        EdgeFeatures {
            length: edge.length,
            travel_time: edge.travel_time_or_estimate(),
            infra: CycleInfra::classify(edge),
            speed_penalty: speed / REFERENCE_SPEED,
            surface_penalty,
            signals: endpoints.iter().filter(|n| n.is_traffic_signal()).count()
                as u32,
            stops: endpoints.iter().filter(|n| n.is_stop_sign()).count() as u32,
        }
    }

    /// Exposure to traffic controls at either end of the edge
    pub fn control_exposure(&self) -> f64 {
        SIGNAL_WEIGHT * self.signals as f64 + STOP_WEIGHT * self.stops as f64
    }

    /// Combine the features into a single cost under the provided weights
    pub fn cost(&self, weights: &WeightVector) -> f64 {
        let no_lane = if self.infra.has_lane() { 0.0 } else { 1.0 };
        let no_track = if self.infra.has_track() { 0.0 } else { 1.0 };

        weights.get(Factor::Distance) * self.length
            + weights.get(Factor::Time) * self.travel_time
            + weights.get(Factor::FindBikeLane) * no_lane * self.length
            + weights.get(Factor::FindProtectedBikeLane)
                * no_track
                * self.length
            + weights.get(Factor::RoadPriority)
                * (self.speed_penalty
                    + self.surface_penalty
                    + self.control_exposure())
    }
}

/// Cost of travelling along an edge between the two provided nodes
pub fn edge_cost(
    edge: &EdgeData,
    from: &NodeData,
    to: &NodeData,
    weights: &WeightVector,
) -> f64 {
    EdgeFeatures::extract(edge, from, to).cost(weights)
}

/// Cost of an edge reference within the graph, looking up both endpoints
pub fn graph_edge_cost(
    graph: &BikeGraph,
    eref: EdgeReference<EdgeData>,
    weights: &WeightVector,
) -> f64 {
    edge_cost(
        eref.weight(),
        &graph[eref.source()],
        &graph[eref.target()],
        weights,
    )
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::common::graph_data::{CyclewayTags, TrafficControl};
    use approx::assert_relative_eq;

    fn get_test_edge() -> EdgeData {
        EdgeData {
            src: 1,
            dst: 2,
            length: 100.0,
            maxspeed: None,
            surface: None,
            highway: "residential".to_string(),
            cycleway: CyclewayTags::default(),
            name: Some("Foothill".to_string()),
            travel_time: Some(24.0),
        }
    }

    fn get_test_node(id: i64, control: TrafficControl) -> NodeData {
        NodeData {
            id,
            x: 0.0,
            y: 0.0,
            control,
        }
    }

    fn plain_nodes() -> (NodeData, NodeData) {
        (
            get_test_node(1, TrafficControl::None),
            get_test_node(2, TrafficControl::None),
        )
    }

    mod test_cycle_infra {

        use super::*;

        /// A plain road has no infrastructure
        #[test]
        fn test_none() {
            let infra = CycleInfra::classify(&get_test_edge());

            assert_eq!(infra, CycleInfra::None);
            assert!(!infra.has_lane());
            assert!(!infra.has_track());
        }

        /// Painted lanes count as lanes but are not protected
        #[test]
        fn test_lane() {
            for tag in ["lane", "shared_lane", "opposite_lane"] {
                let mut edge = get_test_edge();
                edge.cycleway.right = Some(tag.to_string());

                let infra = CycleInfra::classify(&edge);

                assert!(infra.has_lane(), "{tag} should have a lane");
                assert!(!infra.has_track(), "{tag} should not be protected");
            }
        }

        /// Tracks and dedicated cycleways are both lanes and protected
        #[test]
        fn test_protected() {
            let mut track = get_test_edge();
            track.cycleway.both = Some("track".to_string());

            let mut dedicated = get_test_edge();
            dedicated.highway = "cycleway".to_string();

            for edge in [track, dedicated] {
                let infra = CycleInfra::classify(&edge);
                assert!(infra.has_lane());
                assert!(infra.has_track());
            }
        }

        /// The most separated class across all tags wins
        #[test]
        fn test_strongest_tag_wins() {
            let mut edge = get_test_edge();
            edge.cycleway.cycleway = Some("shared_lane".to_string());
            edge.cycleway.left = Some("track".to_string());

            assert_eq!(CycleInfra::classify(&edge), CycleInfra::Track);
        }

        /// Merged edges are classified by their strongest value
        #[test]
        fn test_multi_value_tags() {
            let mut edge = get_test_edge();
            edge.cycleway.right = Some("no;lane".to_string());
            assert_eq!(CycleInfra::classify(&edge), CycleInfra::Lane);

            let mut edge = get_test_edge();
            edge.highway = "residential;cycleway".to_string();
            assert_eq!(CycleInfra::classify(&edge), CycleInfra::DedicatedWay);
        }
    }

    mod test_parse_speed_limit {

        use super::*;

        #[test]
        fn test_missing() {
            let edge = get_test_edge();

            assert_eq!(parse_speed_limit(&edge), Ok(DEFAULT_SPEED_LIMIT));
        }

        #[test]
        fn test_plain_and_units() {
            let mut edge = get_test_edge();

            for (raw, target) in
                [("45", 45.0), ("25 mph", 25.0), ("35 mph;40 mph", 35.0)]
            {
                edge.maxspeed = Some(raw.to_string());
                assert_eq!(parse_speed_limit(&edge), Ok(target));
            }
        }

        /// Unreadable values are reported, rather than silently replaced
        #[test]
        fn test_malformed() {
            let mut edge = get_test_edge();

            for raw in ["walk", "-20", "NaN"] {
                edge.maxspeed = Some(raw.to_string());
                match parse_speed_limit(&edge) {
                    Err(RoutingError::MalformedEdgeAttribute {
                        attribute,
                        value,
                        ..
                    }) => {
                        assert_eq!(attribute, "maxspeed");
                        assert_eq!(value, raw);
                    }
                    other => panic!("Expected an error, got {other:?}"),
                }
            }
        }
    }

    mod test_features {

        use super::*;

        /// Malformed speed limits fall back to the default in the features
        #[test]
        fn test_malformed_speed_substituted() {
            let (from, to) = plain_nodes();
            let mut edge = get_test_edge();
            edge.maxspeed = Some("signals".to_string());

            let result = EdgeFeatures::extract(&edge, &from, &to);

            assert_relative_eq!(result.speed_penalty, 30.0 / 50.0);
        }

        /// Only explicitly unpaved surfaces are penalised
        #[test]
        fn test_surface_penalty() {
            let (from, to) = plain_nodes();
            let mut edge = get_test_edge();

            for (surface, target) in [
                (None, 0.0),
                (Some(""), 0.0),
                (Some("asphalt"), 0.0),
                (Some("Paved"), 0.0),
                (Some("gravel"), 1.0),
                (Some("dirt"), 1.0),
                (Some("asphalt;paved"), 0.0),
                (Some("asphalt;gravel"), 1.0),
            ] {
                edge.surface = surface.map(str::to_string);
                let result = EdgeFeatures::extract(&edge, &from, &to);
                assert_relative_eq!(result.surface_penalty, target);
            }
        }

        /// Signals and stops are counted at both ends of the edge
        #[test]
        fn test_control_exposure() {
            let edge = get_test_edge();
            let from = get_test_node(1, TrafficControl::Signal);
            let to = get_test_node(2, TrafficControl::Stop);

            let result = EdgeFeatures::extract(&edge, &from, &to);

            assert_eq!(result.signals, 1);
            assert_eq!(result.stops, 1);
            assert_relative_eq!(result.control_exposure(), 0.7);
        }

        /// Missing travel times are estimated from the length
        #[test]
        fn test_travel_time_fallback() {
            let (from, to) = plain_nodes();
            let mut edge = get_test_edge();
            edge.travel_time = None;

            let result = EdgeFeatures::extract(&edge, &from, &to);

            assert_relative_eq!(result.travel_time, 20.0);
        }
    }

    mod test_edge_cost {

        use super::*;

        /// Distance weight alone gives the edge length
        #[test]
        fn test_distance_only() {
            let (from, to) = plain_nodes();
            let weights = WeightVector::only(Factor::Distance);

            let result = edge_cost(&get_test_edge(), &from, &to, &weights);

            assert_relative_eq!(result, 100.0);
        }

        /// Time weight alone gives the travel time
        #[test]
        fn test_time_only() {
            let (from, to) = plain_nodes();

            let result = edge_cost(
                &get_test_edge(),
                &from,
                &to,
                &WeightVector::time_only(),
            );

            assert_relative_eq!(result, 24.0);
        }

        /// Lanes remove the bike lane penalty entirely
        #[test]
        fn test_bike_lane_reward() {
            let (from, to) = plain_nodes();
            let weights = WeightVector::only(Factor::FindBikeLane);
            let mut edge = get_test_edge();

            assert_relative_eq!(edge_cost(&edge, &from, &to, &weights), 100.0);

            edge.cycleway.cycleway = Some("lane".to_string());
            assert_relative_eq!(edge_cost(&edge, &from, &to, &weights), 0.0);
        }

        /// Painted lanes do not satisfy the protected lane factor
        #[test]
        fn test_protected_lane_reward() {
            let (from, to) = plain_nodes();
            let weights = WeightVector::only(Factor::FindProtectedBikeLane);
            let mut edge = get_test_edge();

            edge.cycleway.cycleway = Some("lane".to_string());
            assert_relative_eq!(edge_cost(&edge, &from, &to, &weights), 100.0);

            edge.cycleway.cycleway = Some("track".to_string());
            assert_relative_eq!(edge_cost(&edge, &from, &to, &weights), 0.0);
        }

        /// Road priority combines speed, surface and controls
        #[test]
        fn test_road_priority() {
            let weights = WeightVector::only(Factor::RoadPriority);
            let from = get_test_node(1, TrafficControl::Signal);
            let to = get_test_node(2, TrafficControl::Signal);
            let mut edge = get_test_edge();
            edge.maxspeed = Some("50".to_string());
            edge.surface = Some("gravel".to_string());

            let result = edge_cost(&edge, &from, &to, &weights);

            // 50 / 50 + 1 + 2 * 0.5
            assert_relative_eq!(result, 3.0);
        }

        /// Costs are never negative, whatever the weights and attributes
        #[test]
        fn test_non_negative() {
            let ranking_weights = [
                WeightVector::time_only(),
                WeightVector::only(Factor::Distance),
                WeightVector::only(Factor::FindBikeLane),
                WeightVector::only(Factor::FindProtectedBikeLane),
                WeightVector::only(Factor::RoadPriority),
            ];
            let controls = [
                TrafficControl::None,
                TrafficControl::Signal,
                TrafficControl::Stop,
            ];
            let mut edge = get_test_edge();

            for length in [0.0, 0.5, 250.0] {
                for maxspeed in [None, Some("0"), Some("bogus"), Some("65")] {
                    edge.length = length;
                    edge.travel_time = None;
                    edge.maxspeed = maxspeed.map(str::to_string);

                    for control in controls {
                        let from = get_test_node(1, control);
                        let to = get_test_node(2, TrafficControl::None);

                        for weights in ranking_weights.iter() {
                            let cost = edge_cost(&edge, &from, &to, weights);
                            assert!(cost >= 0.0, "negative cost {cost}");
                        }
                    }
                }
            }
        }
    }
}
