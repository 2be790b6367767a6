use std::collections::BTreeMap;

use crate::geo::LatLng;
use crate::math::crs::CrsError;
use crate::math::geodesy::WGS84_A;

const MAX_INVERSE_ITERATIONS: usize = 15;
const INVERSE_TOLERANCE: f64 = 1e-10;
/// Latitude limit applied before projecting; the Mercator y diverges at the poles.
const MAX_PROJECTED_LAT: f64 = 89.999;

/// Parsed `+key=value` projection definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjString {
    params: BTreeMap<String, Option<String>>,
}

impl ProjString {
    pub fn parse(def: &str) -> Result<Self, CrsError> {
        let mut params = BTreeMap::new();
        for token in def.split_whitespace() {
            let Some(body) = token.strip_prefix('+') else {
                return Err(CrsError::MalformedDefinition(token.to_string()));
            };
            match body.split_once('=') {
                Some((k, v)) if !k.is_empty() => {
                    params.insert(k.to_string(), Some(v.to_string()));
                }
                Some(_) => return Err(CrsError::MalformedDefinition(token.to_string())),
                None => {
                    params.insert(body.to_string(), None);
                }
            }
        }
        if params.is_empty() {
            return Err(CrsError::MalformedDefinition(def.to_string()));
        }
        Ok(Self { params })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_deref())
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    fn number(&self, key: &str) -> Result<Option<f64>, CrsError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<f64>()
                .map(Some)
                .map_err(|_| CrsError::InvalidParameter {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }
}

/// Mercator on an ellipsoid (spherical when `a == b`).
///
/// Forward: `x = x0 + a·k0·(λ − λ0)`,
/// `y = y0 + a·k0·ln(tan(π/4 + φ/2)·((1 − e·sinφ)/(1 + e·sinφ))^(e/2))`.
/// The inverse iterates on φ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    pub a: f64,
    pub b: f64,
    pub e: f64,
    pub lon0_rad: f64,
    pub k0: f64,
    pub x0: f64,
    pub y0: f64,
}

impl Mercator {
    /// Spherical Web Mercator (EPSG:3857).
    pub fn web() -> Self {
        Self {
            a: WGS84_A,
            b: WGS84_A,
            e: 0.0,
            lon0_rad: 0.0,
            k0: 1.0,
            x0: 0.0,
            y0: 0.0,
        }
    }

    /// Builds a Mercator from a proj definition. Only `+proj=merc` with
    /// explicit or spherical axes is accepted.
    pub fn from_proj(def: &ProjString) -> Result<Self, CrsError> {
        match def.get("proj") {
            Some("merc") => {}
            Some(other) => return Err(CrsError::UnsupportedProjection(other.to_string())),
            None => return Err(CrsError::MissingParameter("proj")),
        }
        if let Some(units) = def.get("units") {
            if units != "m" {
                return Err(CrsError::InvalidParameter {
                    key: "units".to_string(),
                    value: units.to_string(),
                });
            }
        }

        let (a, b) = match (def.number("a")?, def.number("b")?, def.number("R")?) {
            (Some(a), Some(b), _) => (a, b),
            (Some(a), None, _) => (a, a),
            (None, _, Some(r)) => (r, r),
            (None, _, None) => return Err(CrsError::MissingParameter("a")),
        };
        if !(a > 0.0 && b > 0.0 && b <= a) {
            return Err(CrsError::InvalidParameter {
                key: "b".to_string(),
                value: b.to_string(),
            });
        }
        let e = (1.0 - (b * b) / (a * a)).sqrt();

        let lat_ts = def.number("lat_ts")?.unwrap_or(0.0).to_radians();
        let k = def.number("k")?.or(def.number("k_0")?).unwrap_or(1.0);
        let sin_ts = lat_ts.sin();
        let k0 = k * lat_ts.cos() / (1.0 - e * e * sin_ts * sin_ts).sqrt();

        Ok(Self {
            a,
            b,
            e,
            lon0_rad: def.number("lon_0")?.unwrap_or(0.0).to_radians(),
            k0,
            x0: def.number("x_0")?.unwrap_or(0.0),
            y0: def.number("y_0")?.unwrap_or(0.0),
        })
    }

    pub fn project(&self, p: LatLng) -> [f64; 2] {
        let lat = p.lat.clamp(-MAX_PROJECTED_LAT, MAX_PROJECTED_LAT).to_radians();
        let lon = p.lng.to_radians();
        let x = self.x0 + self.a * self.k0 * (lon - self.lon0_rad);
        let con = self.e * lat.sin();
        let ts = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan()
            * ((1.0 - con) / (1.0 + con)).powf(self.e / 2.0);
        let y = self.y0 + self.a * self.k0 * ts.ln();
        [x, y]
    }

    pub fn unproject(&self, xy: [f64; 2]) -> LatLng {
        let lon = (xy[0] - self.x0) / (self.a * self.k0) + self.lon0_rad;
        let ts = (-(xy[1] - self.y0) / (self.a * self.k0)).exp();
        let half_pi = std::f64::consts::FRAC_PI_2;
        let mut phi = half_pi - 2.0 * ts.atan();
        for _ in 0..MAX_INVERSE_ITERATIONS {
            let con = self.e * phi.sin();
            let next = half_pi - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(self.e / 2.0)).atan();
            let delta = (next - phi).abs();
            phi = next;
            if delta < INVERSE_TOLERANCE {
                break;
            }
        }
        LatLng::new(phi.to_degrees(), lon.to_degrees())
    }
}
