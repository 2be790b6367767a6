//! GeoJSON representation of finished drawings.
//!
//! Coordinates are `[lng, lat]` on the wire and latitude-first in memory.
//! Rectangles travel as closed five-vertex polygons (SW, SE, NE, NW, SW);
//! circles as a center point plus a `radius` property in meters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use compute::measure::{UnitLabels, area_label, circle_area_label, distance_label};
use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;
use foundation::ids::DrawingId;
use foundation::shape::{DrawnShape, Shape, ShapeKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    Feature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum FeatureGeometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl FeatureGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureGeometry::Point(_) => "Point",
            FeatureGeometry::LineString(_) => "LineString",
            FeatureGeometry::Polygon(_) => "Polygon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingProperties {
    #[serde(rename = "type")]
    pub shape_type: ShapeKind,
    /// Empty when absent; import falls back to the shape kind.
    #[serde(rename = "drawingType", default)]
    pub drawing_type: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    /// Formatted total length (lines).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    /// Meters (circles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Formatted area (polygons and circles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingFeature {
    #[serde(rename = "type")]
    pub tag: FeatureTag,
    pub id: DrawingId,
    pub properties: DrawingProperties,
    pub geometry: FeatureGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    Malformed(String),
    GeometryMismatch {
        kind: ShapeKind,
        geometry: &'static str,
    },
    MissingRadius,
    TooFewVertices {
        kind: ShapeKind,
        got: usize,
    },
}

impl std::fmt::Display for FeatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureError::Malformed(e) => write!(f, "malformed drawing feature: {e}"),
            FeatureError::GeometryMismatch { kind, geometry } => {
                write!(f, "{kind} drawing cannot be stored as {geometry}")
            }
            FeatureError::MissingRadius => write!(f, "circle feature has no radius property"),
            FeatureError::TooFewVertices { kind, got } => {
                write!(f, "{kind} ring has only {got} vertices")
            }
        }
    }
}

impl std::error::Error for FeatureError {}

fn lng_lat(points: &[LatLng]) -> Vec<[f64; 2]> {
    points.iter().map(|p| p.to_lng_lat()).collect()
}

fn lat_lng(coords: &[[f64; 2]]) -> Vec<LatLng> {
    coords.iter().map(|c| LatLng::from_lng_lat(*c)).collect()
}

/// Serializes a drawing. `created_at` is an ISO-8601 timestamp.
pub fn to_feature(drawing: &DrawnShape, created_at: &str, labels: UnitLabels) -> DrawingFeature {
    let mut properties = DrawingProperties {
        shape_type: drawing.kind(),
        drawing_type: drawing.drawing_type.clone(),
        created_at: created_at.to_string(),
        length: None,
        radius: None,
        area: None,
    };

    let geometry = match &drawing.shape {
        Shape::Point(p) => FeatureGeometry::Point(p.to_lng_lat()),
        Shape::Line(points) => {
            properties.length = Some(distance_label(points, labels));
            FeatureGeometry::LineString(lng_lat(points))
        }
        Shape::Polygon(points) => {
            properties.area = Some(area_label(points, labels));
            let mut ring = lng_lat(points);
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
            FeatureGeometry::Polygon(vec![ring])
        }
        Shape::Rectangle(b) => {
            let ring = [
                b.south_west,
                b.south_east(),
                b.north_east,
                b.north_west(),
                b.south_west,
            ];
            FeatureGeometry::Polygon(vec![lng_lat(&ring)])
        }
        Shape::Circle { center, radius_m } => {
            properties.radius = Some(*radius_m);
            properties.area = Some(circle_area_label(*radius_m, labels));
            FeatureGeometry::Point(center.to_lng_lat())
        }
    };

    DrawingFeature {
        tag: FeatureTag::Feature,
        id: drawing.id.clone(),
        properties,
        geometry,
    }
}

/// Restores a drawing. Measurement properties are ignored; geometry is
/// reproduced exactly.
pub fn from_feature(feature: &DrawingFeature) -> Result<DrawnShape, FeatureError> {
    let kind = feature.properties.shape_type;
    let mismatch = || FeatureError::GeometryMismatch {
        kind,
        geometry: feature.geometry.type_name(),
    };

    let shape = match (kind, &feature.geometry) {
        (ShapeKind::Point, FeatureGeometry::Point(c)) => Shape::Point(LatLng::from_lng_lat(*c)),
        (ShapeKind::Line, FeatureGeometry::LineString(coords)) => Shape::Line(lat_lng(coords)),
        (ShapeKind::Polygon, FeatureGeometry::Polygon(rings)) => {
            let ring = rings.first().ok_or_else(mismatch)?;
            let mut points = lat_lng(ring);
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            Shape::Polygon(points)
        }
        (ShapeKind::Rectangle, FeatureGeometry::Polygon(rings)) => {
            let ring = rings.first().ok_or_else(mismatch)?;
            if ring.len() < 3 {
                return Err(FeatureError::TooFewVertices {
                    kind,
                    got: ring.len(),
                });
            }
            Shape::Rectangle(LatLngBounds::from_corners(
                LatLng::from_lng_lat(ring[0]),
                LatLng::from_lng_lat(ring[2]),
            ))
        }
        (ShapeKind::Circle, FeatureGeometry::Point(c)) => {
            let radius_m = feature.properties.radius.ok_or(FeatureError::MissingRadius)?;
            Shape::Circle {
                center: LatLng::from_lng_lat(*c),
                radius_m,
            }
        }
        _ => return Err(mismatch()),
    };

    let drawing_type = match feature.properties.drawing_type.as_str() {
        "" => kind.as_str().to_string(),
        given => given.to_string(),
    };
    Ok(DrawnShape::new(feature.id.clone(), shape, drawing_type))
}

impl DrawingFeature {
    pub fn from_value(value: Value) -> Result<Self, FeatureError> {
        serde_json::from_value(value).map_err(|e| FeatureError::Malformed(e.to_string()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const AT: &str = "2023-11-14T22:13:20.000Z";

    fn drawn(shape: Shape, mode: &str) -> DrawnShape {
        DrawnShape::new(DrawingId::new("drawing_1_1700000000000"), shape, mode)
    }

    fn round_trip(d: &DrawnShape) -> DrawnShape {
        let feature = to_feature(d, AT, UnitLabels::Symbols);
        let text = serde_json::to_string(&feature).unwrap();
        let parsed = DrawingFeature::from_value(serde_json::from_str(&text).unwrap()).unwrap();
        from_feature(&parsed).unwrap()
    }

    #[test]
    fn every_kind_round_trips_exactly() {
        let a = LatLng::new(39.9, 116.4);
        let b = LatLng::new(39.95, 116.45);
        let c = LatLng::new(39.92, 116.5);
        let shapes = [
            drawn(Shape::Point(a), "point"),
            drawn(Shape::Line(vec![a, b, c]), "measure-distance"),
            drawn(Shape::Polygon(vec![a, b, c]), "polygon"),
            drawn(Shape::Rectangle(LatLngBounds::from_corners(a, b)), "rectangle"),
            drawn(
                Shape::Circle {
                    center: a,
                    radius_m: 1234.5,
                },
                "circle",
            ),
        ];
        for d in &shapes {
            assert_eq!(&round_trip(d), d);
        }
    }

    #[test]
    fn point_feature_layout() {
        let feature = to_feature(&drawn(Shape::Point(LatLng::new(39.9, 116.4)), "point"), AT, UnitLabels::Symbols);
        assert_eq!(
            feature.to_value(),
            json!({
                "type": "Feature",
                "id": "drawing_1_1700000000000",
                "properties": {"type": "point", "drawingType": "point", "createdAt": AT},
                "geometry": {"type": "Point", "coordinates": [116.4, 39.9]}
            })
        );
    }

    #[test]
    fn rectangle_ring_order() {
        let r = Shape::Rectangle(LatLngBounds::from_corners(
            LatLng::new(1.0, 10.0),
            LatLng::new(2.0, 20.0),
        ));
        let feature = to_feature(&drawn(r, "rectangle"), AT, UnitLabels::Symbols);
        assert_eq!(
            feature.geometry,
            FeatureGeometry::Polygon(vec![vec![
                [10.0, 1.0],
                [20.0, 1.0],
                [20.0, 2.0],
                [10.0, 2.0],
                [10.0, 1.0],
            ]])
        );
        assert!(feature.properties.area.is_none());
    }

    #[test]
    fn polygon_ring_is_closed_and_measured() {
        let pts = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.01),
            LatLng::new(0.01, 0.01),
        ];
        let feature = to_feature(&drawn(Shape::Polygon(pts), "measure-area"), AT, UnitLabels::Chinese);
        let FeatureGeometry::Polygon(rings) = &feature.geometry else {
            panic!("polygon expected");
        };
        assert_eq!(rings[0].len(), 4);
        assert_eq!(rings[0][0], rings[0][3]);
        assert!(feature.properties.area.as_deref().unwrap().ends_with("公顷"));
    }

    #[test]
    fn circle_carries_radius_and_area() {
        let c = Shape::Circle {
            center: LatLng::new(0.0, 0.0),
            radius_m: 100.0,
        };
        let v = to_feature(&drawn(c, "circle"), AT, UnitLabels::Symbols).to_value();
        assert_eq!(v["properties"]["radius"], json!(100.0));
        assert_eq!(v["properties"]["area"], json!("3.14 ha"));
    }

    #[test]
    fn tolerates_missing_measurements() {
        let v = json!({
            "type": "Feature",
            "id": "d1",
            "properties": {"type": "line", "drawingType": "line", "createdAt": AT},
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}
        });
        let shape = from_feature(&DrawingFeature::from_value(v).unwrap()).unwrap();
        assert_eq!(
            shape.shape,
            Shape::Line(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)])
        );
    }

    #[test]
    fn circle_without_radius_is_rejected() {
        let v = json!({
            "type": "Feature",
            "id": "d2",
            "properties": {"type": "circle", "drawingType": "circle", "createdAt": AT},
            "geometry": {"type": "Point", "coordinates": [0, 0]}
        });
        let err = from_feature(&DrawingFeature::from_value(v).unwrap()).unwrap_err();
        assert_eq!(err, FeatureError::MissingRadius);
    }

    #[test]
    fn mismatched_geometry_is_rejected() {
        let v = json!({
            "type": "Feature",
            "id": "d3",
            "properties": {"type": "point", "drawingType": "point", "createdAt": AT},
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}
        });
        let err = from_feature(&DrawingFeature::from_value(v).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::GeometryMismatch {
                kind: ShapeKind::Point,
                geometry: "LineString"
            }
        ));
    }

    #[test]
    fn unknown_shape_type_is_malformed() {
        let v = json!({"type": "Feature", "id": "x", "properties": {"type": "hexagon"}});
        assert!(matches!(
            DrawingFeature::from_value(v),
            Err(FeatureError::Malformed(_))
        ));
    }

    #[test]
    fn missing_drawing_type_falls_back_to_shape_kind() {
        let v = json!({
            "type": "Feature",
            "id": "d4",
            "properties": {"type": "polygon"},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
        });
        let feature = DrawingFeature::from_value(v).unwrap();
        assert_eq!(feature.properties.created_at, "");
        let shape = from_feature(&feature).unwrap();
        assert_eq!(shape.drawing_type, "polygon");
        assert_eq!(shape.kind(), ShapeKind::Polygon);
    }
}
