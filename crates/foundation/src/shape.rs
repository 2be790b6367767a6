use serde::{Deserialize, Serialize};

use crate::bounds::LatLngBounds;
use crate::geo::LatLng;
use crate::ids::DrawingId;
use crate::math::geodesy::EARTH_MEAN_RADIUS_M;

/// Geometry kind of a finished drawing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Point,
    Line,
    Polygon,
    Rectangle,
    Circle,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Line => "line",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A drawn geometry in map coordinates.
///
/// Polygons are stored open (no closing duplicate vertex); rings are closed
/// only when written out as GeoJSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(LatLng),
    Line(Vec<LatLng>),
    Polygon(Vec<LatLng>),
    Rectangle(LatLngBounds),
    Circle { center: LatLng, radius_m: f64 },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Point,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Polygon(_) => ShapeKind::Polygon,
            Shape::Rectangle(_) => ShapeKind::Rectangle,
            Shape::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Geographic extent. Circles use a spherical approximation of their radius.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        match self {
            Shape::Point(p) => Some(LatLngBounds::from_corners(*p, *p)),
            Shape::Line(pts) | Shape::Polygon(pts) => LatLngBounds::from_points(pts),
            Shape::Rectangle(b) => Some(*b),
            Shape::Circle { center, radius_m } => {
                let dlat = (radius_m / EARTH_MEAN_RADIUS_M).to_degrees();
                let dlng = dlat / center.lat.to_radians().cos().max(1e-12);
                Some(LatLngBounds::from_corners(
                    LatLng::new(center.lat - dlat, center.lng - dlng),
                    LatLng::new(center.lat + dlat, center.lng + dlng),
                ))
            }
        }
    }
}

/// A finished drawing: geometry plus the id it was minted under and the
/// drawing mode that produced it (`"line"`, `"measure-distance"`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnShape {
    pub id: DrawingId,
    pub shape: Shape,
    pub drawing_type: String,
}

impl DrawnShape {
    pub fn new(id: DrawingId, shape: Shape, drawing_type: impl Into<String>) -> Self {
        Self {
            id,
            shape,
            drawing_type: drawing_type.into(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }
}
