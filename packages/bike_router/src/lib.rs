//! Bike routing over a road network, where the cost of a route is a blend
//! of distance, travel time, cycling infrastructure and exposure to traffic
//! controls, weighted by the user's ranked priorities.

pub mod common;
pub mod loading;
pub mod routing;
