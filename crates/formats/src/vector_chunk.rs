//! Generic GeoJSON ingestion for vector overlay layers (WFS responses,
//! remote GeoJSON, local JSON files).

use serde_json::{Map, Value};

use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;

#[derive(Debug, Clone, PartialEq)]
pub enum VectorGeometry {
    Point(LatLng),
    MultiPoint(Vec<LatLng>),
    LineString(Vec<LatLng>),
    MultiLineString(Vec<Vec<LatLng>>),
    Polygon(Vec<Vec<LatLng>>),
    MultiPolygon(Vec<Vec<Vec<LatLng>>>),
    GeometryCollection(Vec<VectorGeometry>),
}

impl VectorGeometry {
    fn visit_points(&self, f: &mut impl FnMut(LatLng)) {
        match self {
            VectorGeometry::Point(p) => f(*p),
            VectorGeometry::MultiPoint(ps) | VectorGeometry::LineString(ps) => {
                ps.iter().copied().for_each(&mut *f)
            }
            VectorGeometry::MultiLineString(lines) | VectorGeometry::Polygon(lines) => lines
                .iter()
                .flatten()
                .copied()
                .for_each(&mut *f),
            VectorGeometry::MultiPolygon(polys) => polys
                .iter()
                .flatten()
                .flatten()
                .copied()
                .for_each(&mut *f),
            VectorGeometry::GeometryCollection(parts) => {
                parts.iter().for_each(|g| g.visit_points(f))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: VectorGeometry,
}

/// A parsed set of GeoJSON features.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorChunk {
    pub features: Vec<VectorFeature>,
}

#[derive(Debug)]
pub enum VectorChunkError {
    InvalidJson(String),
    NotGeoJson(String),
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for VectorChunkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorChunkError::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            VectorChunkError::NotGeoJson(what) => write!(f, "not a GeoJSON object: {what}"),
            VectorChunkError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for VectorChunkError {}

impl VectorChunk {
    pub fn from_geojson_str(payload: &str) -> Result<Self, VectorChunkError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| VectorChunkError::InvalidJson(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    /// Accepts a `FeatureCollection`, a single `Feature`, or a bare geometry.
    /// Features whose geometry is `null` are dropped.
    pub fn from_geojson_value(value: &Value) -> Result<Self, VectorChunkError> {
        let obj = value
            .as_object()
            .ok_or_else(|| VectorChunkError::NotGeoJson("expected an object".to_string()))?;
        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| VectorChunkError::NotGeoJson("missing \"type\"".to_string()))?;

        let mut features = Vec::new();
        match ty {
            "FeatureCollection" => {
                let items = obj.get("features").and_then(Value::as_array).ok_or_else(|| {
                    VectorChunkError::NotGeoJson("FeatureCollection without features".to_string())
                })?;
                for (index, item) in items.iter().enumerate() {
                    let parsed = parse_feature(item)
                        .map_err(|reason| VectorChunkError::InvalidFeature { index, reason })?;
                    features.extend(parsed);
                }
            }
            "Feature" => {
                let parsed = parse_feature(value)
                    .map_err(|reason| VectorChunkError::InvalidFeature { index: 0, reason })?;
                features.extend(parsed);
            }
            _ => {
                let geometry = parse_geometry(value)
                    .map_err(|reason| VectorChunkError::InvalidFeature { index: 0, reason })?;
                features.push(VectorFeature {
                    id: None,
                    properties: Map::new(),
                    geometry,
                });
            }
        }
        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Extent of every coordinate in the chunk.
    pub fn bounds(&self) -> Option<LatLngBounds> {
        let mut out: Option<LatLngBounds> = None;
        for feat in &self.features {
            feat.geometry.visit_points(&mut |p| {
                if let Some(b) = out.as_mut() {
                    b.extend(p);
                } else {
                    out = Some(LatLngBounds::from_corners(p, p));
                }
            });
        }
        out
    }

    /// Emits a `FeatureCollection`.
    pub fn to_geojson_value(&self) -> Value {
        let features = self
            .features
            .iter()
            .map(|feat| {
                let mut fobj = Map::new();
                fobj.insert("type".to_string(), Value::from("Feature"));
                if let Some(id) = &feat.id {
                    fobj.insert("id".to_string(), Value::from(id.clone()));
                }
                fobj.insert(
                    "properties".to_string(),
                    Value::Object(feat.properties.clone()),
                );
                fobj.insert("geometry".to_string(), geometry_to_value(&feat.geometry));
                Value::Object(fobj)
            })
            .collect();

        let mut root = Map::new();
        root.insert("type".to_string(), Value::from("FeatureCollection"));
        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }
}

pub(crate) fn point_value(p: LatLng) -> Value {
    Value::Array(vec![Value::from(p.lng), Value::from(p.lat)])
}

pub(crate) fn line_value(points: &[LatLng]) -> Value {
    Value::Array(points.iter().map(|p| point_value(*p)).collect())
}

fn geometry_to_value(geom: &VectorGeometry) -> Value {
    let (ty, coords) = match geom {
        VectorGeometry::Point(p) => ("Point", point_value(*p)),
        VectorGeometry::MultiPoint(ps) => ("MultiPoint", line_value(ps)),
        VectorGeometry::LineString(ps) => ("LineString", line_value(ps)),
        VectorGeometry::MultiLineString(lines) => (
            "MultiLineString",
            Value::Array(lines.iter().map(|l| line_value(l)).collect()),
        ),
        VectorGeometry::Polygon(rings) => (
            "Polygon",
            Value::Array(rings.iter().map(|r| line_value(r)).collect()),
        ),
        VectorGeometry::MultiPolygon(polys) => (
            "MultiPolygon",
            Value::Array(
                polys
                    .iter()
                    .map(|rings| Value::Array(rings.iter().map(|r| line_value(r)).collect()))
                    .collect(),
            ),
        ),
        VectorGeometry::GeometryCollection(parts) => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), Value::from("GeometryCollection"));
            obj.insert(
                "geometries".to_string(),
                Value::Array(parts.iter().map(geometry_to_value).collect()),
            );
            return Value::Object(obj);
        }
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::from(ty));
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn parse_feature(value: &Value) -> Result<Option<VectorFeature>, String> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    match obj.get("type").and_then(Value::as_str) {
        Some("Feature") => {}
        Some(other) => return Err(format!("unexpected feature type: {other}")),
        None => return Err("feature missing type".to_string()),
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    match obj.get("geometry") {
        None => Err("feature missing geometry".to_string()),
        Some(Value::Null) => Ok(None),
        Some(g) => Ok(Some(VectorFeature {
            id,
            properties,
            geometry: parse_geometry(g)?,
        })),
    }
}

pub(crate) fn parse_geometry(value: &Value) -> Result<VectorGeometry, String> {
    let obj = value.as_object().ok_or("geometry must be an object")?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type")?;

    if ty == "GeometryCollection" {
        let parts = obj
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or("GeometryCollection missing geometries")?;
        return parts
            .iter()
            .map(parse_geometry)
            .collect::<Result<Vec<_>, _>>()
            .map(VectorGeometry::GeometryCollection);
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates")?;
    match ty {
        "Point" => Ok(VectorGeometry::Point(parse_position(coords)?)),
        "MultiPoint" => Ok(VectorGeometry::MultiPoint(parse_positions(coords)?)),
        "LineString" => Ok(VectorGeometry::LineString(parse_positions(coords)?)),
        "MultiLineString" => Ok(VectorGeometry::MultiLineString(parse_nested(
            coords,
            parse_positions,
        )?)),
        "Polygon" => Ok(VectorGeometry::Polygon(parse_nested(coords, parse_positions)?)),
        "MultiPolygon" => Ok(VectorGeometry::MultiPolygon(parse_nested(coords, |rings| {
            parse_nested(rings, parse_positions)
        })?)),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

/// `[lng, lat, ...]` into a latitude-first point.
pub(crate) fn parse_position(coords: &Value) -> Result<LatLng, String> {
    let arr = coords.as_array().ok_or("position must be an array")?;
    match (
        arr.first().and_then(Value::as_f64),
        arr.get(1).and_then(Value::as_f64),
    ) {
        (Some(lng), Some(lat)) => Ok(LatLng::new(lat, lng)),
        _ => Err("position must start with numeric [lng, lat]".to_string()),
    }
}

pub(crate) fn parse_positions(coords: &Value) -> Result<Vec<LatLng>, String> {
    parse_nested(coords, parse_position)
}

fn parse_nested<T>(
    coords: &Value,
    item: impl Fn(&Value) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    coords
        .as_array()
        .ok_or("coordinates must be an array")?
        .iter()
        .map(item)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{VectorChunk, VectorChunkError, VectorGeometry};
    use foundation::geo::LatLng;

    #[test]
    fn parses_feature_collection() {
        let payload = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 7, "properties": {"name": "Beijing"},
                 "geometry": {"type": "Point", "coordinates": [116.4, 39.9]}},
                {"type": "Feature", "properties": null,
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        }"#;
        let chunk = VectorChunk::from_geojson_str(payload).unwrap();
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.features[0].id.as_deref(), Some("7"));
        assert_eq!(
            chunk.features[0].geometry,
            VectorGeometry::Point(LatLng::new(39.9, 116.4))
        );
        assert!(chunk.features[1].properties.is_empty());
    }

    #[test]
    fn accepts_single_feature_and_bare_geometry() {
        let feature = json!({
            "type": "Feature",
            "properties": {"k": 1},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}
        });
        assert_eq!(VectorChunk::from_geojson_value(&feature).unwrap().len(), 1);

        let geom = json!({"type": "MultiPoint", "coordinates": [[1, 2], [3, 4]]});
        let chunk = VectorChunk::from_geojson_value(&geom).unwrap();
        assert_eq!(
            chunk.features[0].geometry,
            VectorGeometry::MultiPoint(vec![LatLng::new(2.0, 1.0), LatLng::new(4.0, 3.0)])
        );
    }

    #[test]
    fn bounds_cover_nested_geometries() {
        let geom = json!({
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [10, -5]},
                {"type": "MultiPolygon", "coordinates": [[[[0, 0], [20, 0], [20, 8], [0, 0]]]]}
            ]
        });
        let b = VectorChunk::from_geojson_value(&geom).unwrap().bounds().unwrap();
        assert_eq!(b.south_west, LatLng::new(-5.0, 0.0));
        assert_eq!(b.north_east, LatLng::new(8.0, 20.0));
        assert!(VectorChunk::default().bounds().is_none());
    }

    #[test]
    fn reports_bad_input() {
        assert!(matches!(
            VectorChunk::from_geojson_str("{"),
            Err(VectorChunkError::InvalidJson(_))
        ));
        assert!(matches!(
            VectorChunk::from_geojson_value(&json!([1, 2])),
            Err(VectorChunkError::NotGeoJson(_))
        ));
        let bad = json!({"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": ["x", 1]}}
        ]});
        let err = VectorChunk::from_geojson_value(&bad).unwrap_err();
        assert!(err.to_string().starts_with("invalid feature at index 0"));
    }

    #[test]
    fn export_keeps_lng_lat_order() {
        let geom = json!({"type": "Point", "coordinates": [116.4, 39.9]});
        let chunk = VectorChunk::from_geojson_value(&geom).unwrap();
        let out = chunk.to_geojson_value();
        assert_eq!(out["features"][0]["geometry"]["coordinates"], json!([116.4, 39.9]));
        assert_eq!(VectorChunk::from_geojson_value(&out).unwrap(), chunk);
    }
}
