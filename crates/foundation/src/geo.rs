use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Geodetic datum a coordinate is expressed in.
///
/// - `Wgs84`: GPS / international standard.
/// - `Gcj02`: the obfuscated datum mandated for maps of mainland China.
/// - `Bd09`: Baidu's further-offset variant of GCJ02.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datum {
    Wgs84,
    Gcj02,
    Bd09,
}

impl Datum {
    pub fn as_str(self) -> &'static str {
        match self {
            Datum::Wgs84 => "wgs84",
            Datum::Gcj02 => "gcj02",
            Datum::Bd09 => "bd09",
        }
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDatum(pub String);

impl std::fmt::Display for UnknownDatum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown datum: {} (expected wgs84, gcj02 or bd09)", self.0)
    }
}

impl std::error::Error for UnknownDatum {}

impl FromStr for Datum {
    type Err = UnknownDatum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgs84" | "wgs-84" | "epsg:4326" => Ok(Datum::Wgs84),
            "gcj02" | "gcj-02" => Ok(Datum::Gcj02),
            "bd09" | "bd-09" => Ok(Datum::Bd09),
            _ => Err(UnknownDatum(s.to_string())),
        }
    }
}

/// Latitude-first map coordinate in degrees.
///
/// This is the representation used on the map surface and in the drawing
/// session. GeoJSON uses `[lng, lat]`; convert at the boundary with
/// [`LatLng::to_lng_lat`] / [`LatLng::from_lng_lat`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat(coords: [f64; 2]) -> Self {
        Self::new(coords[1], coords[0])
    }

    pub fn in_datum(self, datum: Datum) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng, datum)
    }
}

/// A coordinate tagged with the datum it is expressed in.
///
/// The datum is never implicit: converting goes through
/// [`GeoPoint::to_datum`], which always yields a point in the target datum.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub datum: Datum,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64, datum: Datum) -> Self {
        Self { lat, lng, datum }
    }

    pub const fn wgs84(lat: f64, lng: f64) -> Self {
        Self::new(lat, lng, Datum::Wgs84)
    }

    pub fn latlng(self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn to_datum(self, target: Datum) -> GeoPoint {
        crate::math::datum::convert(self, target)
    }
}
