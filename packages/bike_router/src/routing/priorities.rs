//! Converts the user's ranking of cost factors into the weights used by the
//! edge cost model. Each ranked factor scores the inverse of its rank, and
//! scores are scaled so that all weights sum to one.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::common::config::{Factor, PriorityRanking};
use crate::common::error::RoutingError;

/// Normalized, non-negative weight for every cost factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightVector {
    weights: [f64; 5],
}

impl WeightVector {
    /// All weight is placed on travel time. This is used whenever the user
    /// has not ranked anything, as an all-zero vector would make every path
    /// equally cheap
    pub fn time_only() -> WeightVector {
        WeightVector::only(Factor::Time)
    }

    /// Place all weight on a single factor
    pub fn only(factor: Factor) -> WeightVector {
        let mut weights = [0.0; 5];
        weights[factor.index()] = 1.0;
        WeightVector { weights }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        self.weights[factor.index()]
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Serialized as a map from factor label to weight
impl Serialize for WeightVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Factor::ALL.len()))?;
        for factor in Factor::ALL {
            map.serialize_entry(factor.label(), &self.get(factor))?;
        }
        map.end()
    }
}

impl fmt::Display for WeightVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Factor::ALL
            .iter()
            .filter(|factor| self.get(**factor) > 0.0)
            .map(|factor| format!("{}: {:.3}", factor, self.get(*factor)))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Convert a ranking into normalized weights. Ranks must be unique and no
/// greater than 5, otherwise InvalidRanking is returned. If no factor has a
/// positive rank, all weight is placed on travel time
pub fn normalize(
    ranking: &PriorityRanking,
) -> Result<WeightVector, RoutingError> {
    ranking.validate()?;

    let mut inverse = [0.0; 5];
    for (factor, rank) in ranking.iter() {
        if let Some(rank) = rank.filter(|rank| *rank > 0) {
            inverse[factor.index()] = 1.0 / rank as f64;
        }
    }

    let total: f64 = inverse.iter().sum();
    if total <= 0.0 {
        return Ok(WeightVector::time_only());
    }

    let weights = inverse.map(|score| score / total);

    Ok(WeightVector { weights })
}
