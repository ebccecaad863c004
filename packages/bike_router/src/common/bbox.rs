//! Defines a struct to represent a bounding box in the projected coordinate
//! system of the graph. This is used when rendering a completed route, as it
//! can be used to set the viewport on a map visualization

use geo::Point;
use serde::Serialize;

/// Margin added around a route when framing it for display, in metres
pub const ROUTE_BBOX_MARGIN: f64 = 250.0;

/// A bounding box for projected data. Contains the minimum and maximum x & y
/// coordinates, defining a rectangle in metres
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Create a new bounding box based on the north-east and south-west points
    /// of a rectangle
    pub fn from_points(ne: &Point, sw: &Point) -> Self {
        BBox {
            min_x: sw.x(),
            min_y: sw.y(),
            max_x: ne.x(),
            max_y: ne.y(),
        }
    }

    /// Create the smallest bounding box containing every provided point. If
    /// no points are provided, None is returned
    pub fn enclosing<'a>(
        points: impl IntoIterator<Item = &'a Point>,
    ) -> Option<Self> {
        points.into_iter().fold(None, |bbox, point| match bbox {
            None => Some(BBox::from_points(point, point)),
            Some(bbox) => Some(BBox {
                min_x: bbox.min_x.min(point.x()),
                min_y: bbox.min_y.min(point.y()),
                max_x: bbox.max_x.max(point.x()),
                max_y: bbox.max_y.max(point.y()),
            }),
        })
    }

    /// Grow the bounding box by the provided margin on every side
    pub fn with_margin(&self, margin: f64) -> Self {
        BBox {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Determine the x and y coordinates which form the centre point of the
    /// bounding box
    pub fn get_centre(&self) -> (f64, f64) {
        let x_delta = self.max_x - self.min_x;
        let y_delta = self.max_y - self.min_y;
        (self.min_x + (x_delta / 2.0), self.min_y + (y_delta / 2.0))
    }
}
