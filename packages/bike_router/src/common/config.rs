//! This module contains structs which represent the routing options selected
//! by the end user. In particular, the PriorityRanking struct carries the
//! user's ordering of cost factors through to the priority normalizer, and
//! the RouteRequestConfig struct bundles it with the requested end points.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::common::error::RoutingError;

/// Lowest priority which can be assigned to a cost factor
pub const MAX_RANK: i64 = 5;

/// Environment variable holding the path to the graph rows file
pub const GRAPH_FILE_VAR: &str = "BIKE_ROUTER_GRAPH";

/// Environment variable holding the address to serve the API on
pub const BIND_ADDR_VAR: &str = "BIKE_ROUTER_ADDR";

const DEFAULT_GRAPH_FILE: &str = "graph.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// The closed set of cost factors a user can express a priority for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Factor {
    Distance,
    Time,
    FindBikeLane,
    FindProtectedBikeLane,
    RoadPriority,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::Distance,
        Factor::Time,
        Factor::FindBikeLane,
        Factor::FindProtectedBikeLane,
        Factor::RoadPriority,
    ];

    /// Position of the factor in per-factor arrays
    pub fn index(self) -> usize {
        self as usize
    }

    /// The label shown to users when selecting priorities
    pub fn label(self) -> &'static str {
        match self {
            Factor::Distance => "Distance",
            Factor::Time => "Time",
            Factor::FindBikeLane => "Find Bike Lane",
            Factor::FindProtectedBikeLane => "Find Protected Bike Lane",
            Factor::RoadPriority => "Road Priority",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Factor {
    type Err = RoutingError;

    /// Accepts either the user-facing label ("Find Bike Lane") or its
    /// snake_case form ("find_bike_lane"), ignoring case
    fn from_str(input: &str) -> Result<Factor, Self::Err> {
        let key = input.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "distance" => Ok(Factor::Distance),
            "time" => Ok(Factor::Time),
            "find_bike_lane" => Ok(Factor::FindBikeLane),
            "find_protected_bike_lane" => Ok(Factor::FindProtectedBikeLane),
            "road_priority" => Ok(Factor::RoadPriority),
            _ => Err(RoutingError::InvalidRanking(format!(
                "unknown priority '{}'",
                input.trim()
            ))),
        }
    }
}

/// A sparse ranking of cost factors, 1 being the most important. Factors
/// without a rank (or with a non-positive one) carry no preference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityRanking {
    ranks: [Option<i64>; 5],
}

impl PriorityRanking {
    pub fn new() -> PriorityRanking {
        PriorityRanking::default()
    }

    /// Builder style helper for assigning a rank to a single factor
    pub fn with_rank(mut self, factor: Factor, rank: i64) -> PriorityRanking {
        self.ranks[factor.index()] = Some(rank);
        self
    }

    pub fn set_rank(&mut self, factor: Factor, rank: Option<i64>) {
        self.ranks[factor.index()] = rank;
    }

    pub fn rank(&self, factor: Factor) -> Option<i64> {
        self.ranks[factor.index()]
    }

    /// Iterate over every factor alongside its rank, if any
    pub fn iter(&self) -> impl Iterator<Item = (Factor, Option<i64>)> + '_ {
        Factor::ALL
            .into_iter()
            .map(|factor| (factor, self.rank(factor)))
    }

    /// Create a ranking from the user's ordered priority slots. The factor
    /// in slot n receives rank n + 1, empty slots keep their position. A
    /// factor may only be selected once, and at most MAX_RANK slots exist
    pub fn from_selections(
        selections: &[Option<Factor>],
    ) -> Result<PriorityRanking, RoutingError> {
        if selections.len() > MAX_RANK as usize {
            return Err(RoutingError::InvalidRanking(format!(
                "{} priorities provided, at most {} are allowed",
                selections.len(),
                MAX_RANK
            )));
        }

        let mut ranking = PriorityRanking::new();
        for (inx, selection) in selections.iter().enumerate() {
            if let Some(factor) = selection {
                if ranking.rank(*factor).is_some() {
                    return Err(RoutingError::InvalidRanking(format!(
                        "'{factor}' was selected more than once"
                    )));
                }
                ranking.set_rank(*factor, Some(inx as i64 + 1));
            }
        }

        Ok(ranking)
    }

    /// Check that every positive rank is within 1..=MAX_RANK and that no two
    /// factors share a rank
    pub fn validate(&self) -> Result<(), RoutingError> {
        let mut seen: [Option<Factor>; MAX_RANK as usize] = [None; 5];

        for (factor, rank) in self.iter() {
            let rank = match rank {
                Some(rank) if rank > 0 => rank,
                _ => continue,
            };

            if rank > MAX_RANK {
                return Err(RoutingError::InvalidRanking(format!(
                    "'{factor}' has rank {rank}, ranks must be between 1 \
                     and {MAX_RANK}"
                )));
            }

            let slot = &mut seen[(rank - 1) as usize];
            if let Some(other) = slot {
                return Err(RoutingError::InvalidRanking(format!(
                    "'{other}' and '{factor}' share rank {rank}"
                )));
            }
            *slot = Some(factor);
        }

        Ok(())
    }
}

impl FromStr for PriorityRanking {
    type Err = RoutingError;

    /// Parse a comma separated list of priority slots, most important
    /// first. Blank entries are treated as empty slots
    fn from_str(input: &str) -> Result<PriorityRanking, Self::Err> {
        if input.trim().is_empty() {
            return Ok(PriorityRanking::new());
        }

        let selections = input
            .split(',')
            .map(|item| match item.trim() {
                "" => Ok(None),
                name => Factor::from_str(name).map(Some),
            })
            .collect::<Result<Vec<Option<Factor>>, RoutingError>>()?;

        PriorityRanking::from_selections(&selections)
    }
}

/// Stores the user's requested route exactly as it is received from the
/// API. Coordinates are in the graph's projected coordinate system
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UserRouteConfig {
    pub from_x: f64,
    pub from_y: f64,
    pub to_x: f64,
    pub to_y: f64,
    #[serde(default)]
    pub priorities: Option<String>,
}

/// Stores the user's requested route in a format which can be used in the
/// rest of this package. Users should first create a UserRouteConfig and
/// use .try_into() to convert to RouteRequestConfig
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequestConfig {
    pub origin: Point,
    pub destination: Point,
    pub ranking: PriorityRanking,
}

impl TryFrom<UserRouteConfig> for RouteRequestConfig {
    type Error = RoutingError;

    fn try_from(
        config: UserRouteConfig,
    ) -> Result<RouteRequestConfig, Self::Error> {
        let coords = [config.from_x, config.from_y, config.to_x, config.to_y];
        if coords.iter().any(|coord| !coord.is_finite()) {
            return Err(RoutingError::InvalidCoordinates);
        }

        let ranking = match &config.priorities {
            Some(priorities) => PriorityRanking::from_str(priorities)?,
            None => PriorityRanking::new(),
        };

        Ok(RouteRequestConfig {
            origin: Point::new(config.from_x, config.from_y),
            destination: Point::new(config.to_x, config.to_y),
            ranking,
        })
    }
}

/// Settings for the API server, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub graph_file: PathBuf,
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> ServerConfig {
        ServerConfig::from_vars(
            env::var(GRAPH_FILE_VAR).ok(),
            env::var(BIND_ADDR_VAR).ok(),
        )
    }

    /// Build the config from optional raw values, falling back to defaults
    /// for anything which is missing or blank
    pub fn from_vars(
        graph_file: Option<String>,
        bind_addr: Option<String>,
    ) -> ServerConfig {
        let graph_file = graph_file
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GRAPH_FILE.to_string());
        let bind_addr = bind_addr
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        ServerConfig {
            graph_file: PathBuf::from(graph_file),
            bind_addr,
        }
    }
}
