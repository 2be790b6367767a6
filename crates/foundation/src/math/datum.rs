//! WGS84 / GCJ02 / BD09 datum shifts.
//!
//! GCJ02 is a closed-form forward offset; its inverse is the usual one-step
//! reflection `2 * input - forward(input)`, accurate to a couple of meters
//! over mainland China. BD09 adds a rotation/scale on top of GCJ02 and has a
//! matching approximate inverse.

use std::f64::consts::PI;

use crate::geo::{Datum, GeoPoint};

/// Krasovsky 1940 semi-major axis used by the GCJ02 offset.
pub const KRASOVSKY_A: f64 = 6_378_245.0;
/// Krasovsky 1940 first eccentricity squared.
pub const KRASOVSKY_EE: f64 = 0.006_693_421_622_965_943_23;
/// `PI * 3000 / 180`, the BD09 angular constant.
pub const BD09_X_PI: f64 = PI * 3000.0 / 180.0;

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lng(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// Whether a coordinate falls outside the rough mainland-China box.
///
/// The transforms below never consult this; it is exposed for callers that
/// want to skip the offset for foreign coordinates.
pub fn out_of_china(lng: f64, lat: f64) -> bool {
    !(72.004..=137.8347).contains(&lng) || !(0.8293..=55.8271).contains(&lat)
}

/// Returns `(lng, lat)` in GCJ02.
pub fn wgs84_to_gcj02(lng: f64, lat: f64) -> (f64, f64) {
    let mut dlat = transform_lat(lng - 105.0, lat - 35.0);
    let mut dlng = transform_lng(lng - 105.0, lat - 35.0);
    let radlat = lat / 180.0 * PI;
    let mut magic = radlat.sin();
    magic = 1.0 - KRASOVSKY_EE * magic * magic;
    let sqrtmagic = magic.sqrt();
    dlat = (dlat * 180.0) / ((KRASOVSKY_A * (1.0 - KRASOVSKY_EE)) / (magic * sqrtmagic) * PI);
    dlng = (dlng * 180.0) / (KRASOVSKY_A / sqrtmagic * radlat.cos() * PI);
    (lng + dlng, lat + dlat)
}

/// Returns `(lng, lat)` in WGS84 (reflection approximation).
pub fn gcj02_to_wgs84(lng: f64, lat: f64) -> (f64, f64) {
    let (mglng, mglat) = wgs84_to_gcj02(lng, lat);
    (lng * 2.0 - mglng, lat * 2.0 - mglat)
}

pub fn gcj02_to_bd09(lng: f64, lat: f64) -> (f64, f64) {
    let z = (lng * lng + lat * lat).sqrt() + 0.00002 * (lat * BD09_X_PI).sin();
    let theta = lat.atan2(lng) + 0.000003 * (lng * BD09_X_PI).cos();
    (z * theta.cos() + 0.0065, z * theta.sin() + 0.006)
}

pub fn bd09_to_gcj02(lng: f64, lat: f64) -> (f64, f64) {
    let x = lng - 0.0065;
    let y = lat - 0.006;
    let z = (x * x + y * y).sqrt() - 0.00002 * (y * BD09_X_PI).sin();
    let theta = y.atan2(x) - 0.000003 * (x * BD09_X_PI).cos();
    (z * theta.cos(), z * theta.sin())
}

pub fn wgs84_to_bd09(lng: f64, lat: f64) -> (f64, f64) {
    let (glng, glat) = wgs84_to_gcj02(lng, lat);
    gcj02_to_bd09(glng, glat)
}

pub fn bd09_to_wgs84(lng: f64, lat: f64) -> (f64, f64) {
    let (glng, glat) = bd09_to_gcj02(lng, lat);
    gcj02_to_wgs84(glng, glat)
}

/// Converts a tagged point into `target`. Same-datum conversion is identity.
pub fn convert(point: GeoPoint, target: Datum) -> GeoPoint {
    let (lng, lat) = (point.lng, point.lat);
    let (lng, lat) = match (point.datum, target) {
        (Datum::Wgs84, Datum::Wgs84)
        | (Datum::Gcj02, Datum::Gcj02)
        | (Datum::Bd09, Datum::Bd09) => (lng, lat),
        (Datum::Wgs84, Datum::Gcj02) => wgs84_to_gcj02(lng, lat),
        (Datum::Wgs84, Datum::Bd09) => wgs84_to_bd09(lng, lat),
        (Datum::Gcj02, Datum::Wgs84) => gcj02_to_wgs84(lng, lat),
        (Datum::Gcj02, Datum::Bd09) => gcj02_to_bd09(lng, lat),
        (Datum::Bd09, Datum::Gcj02) => bd09_to_gcj02(lng, lat),
        (Datum::Bd09, Datum::Wgs84) => bd09_to_wgs84(lng, lat),
    };
    GeoPoint::new(lat, lng, target)
}
