//! Map coordinate reference systems: the standard Web Mercator used by most
//! tile providers, and Baidu's custom Mercator with its fixed resolution
//! ladder.

use once_cell::sync::OnceCell;

use crate::bounds::Aabb2;
use crate::geo::LatLng;
use crate::math::projection::{Mercator, ProjString};

pub const BAIDU_CRS_CODE: &str = "EPSG:900913";
pub const BAIDU_PROJ_DEF: &str = "+proj=merc +a=6378206 +b=6356584.314245179 +lat_ts=0.0 +lon_0=0.0 +x_0=0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs";
pub const BAIDU_ZOOM_LEVELS: usize = 19;
pub const BAIDU_MAX_EXTENT: f64 = 20_037_508.342_789_244;
pub const TILE_SIZE: f64 = 256.0;

static BAIDU_RESOLUTIONS: OnceCell<[f64; BAIDU_ZOOM_LEVELS]> = OnceCell::new();
static BAIDU_CRS: OnceCell<ProjectedCrs> = OnceCell::new();

#[derive(Debug, Clone, PartialEq)]
pub enum CrsError {
    MalformedDefinition(String),
    MissingParameter(&'static str),
    InvalidParameter { key: String, value: String },
    UnsupportedProjection(String),
    EmptyResolutions,
}

impl std::fmt::Display for CrsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrsError::MalformedDefinition(tok) => write!(f, "malformed projection token: {tok}"),
            CrsError::MissingParameter(key) => write!(f, "projection definition is missing +{key}"),
            CrsError::InvalidParameter { key, value } => {
                write!(f, "invalid projection parameter +{key}={value}")
            }
            CrsError::UnsupportedProjection(p) => write!(f, "unsupported projection: +proj={p}"),
            CrsError::EmptyResolutions => write!(f, "resolution ladder is empty"),
        }
    }
}

impl std::error::Error for CrsError {}

/// Baidu's meters-per-pixel ladder: `r[z] = 2^(18 - z)` for z in 0..=18.
///
/// Built once per process.
pub fn baidu_resolutions() -> &'static [f64] {
    BAIDU_RESOLUTIONS.get_or_init(|| {
        let mut res = [0.0; BAIDU_ZOOM_LEVELS];
        res[0] = 2f64.powi(18);
        for (i, r) in res.iter_mut().enumerate().skip(1) {
            *r = 2f64.powi(18 - i as i32);
        }
        res
    })
}

/// A projected CRS with a discrete resolution ladder, in the shape
/// proj4leaflet uses: pixel = transform(project(latlng)) * (1 / resolution).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCrs {
    pub code: String,
    pub projection: Mercator,
    pub resolutions: Vec<f64>,
    pub origin: [f64; 2],
    pub bounds: Aabb2,
}

impl ProjectedCrs {
    pub fn from_proj_string(
        code: impl Into<String>,
        def: &str,
        resolutions: Vec<f64>,
        origin: [f64; 2],
        bounds: Aabb2,
    ) -> Result<Self, CrsError> {
        if resolutions.is_empty() {
            return Err(CrsError::EmptyResolutions);
        }
        let projection = Mercator::from_proj(&ProjString::parse(def)?)?;
        Ok(Self {
            code: code.into(),
            projection,
            resolutions,
            origin,
            bounds,
        })
    }

    pub fn project(&self, p: LatLng) -> [f64; 2] {
        self.projection.project(p)
    }

    pub fn unproject(&self, xy: [f64; 2]) -> LatLng {
        self.projection.unproject(xy)
    }

    /// Pixels per projected meter at `zoom`. Fractional zooms interpolate
    /// linearly between neighbouring ladder entries; zooms off the ladder
    /// yield `None`.
    pub fn scale(&self, zoom: f64) -> Option<f64> {
        if !zoom.is_finite() || zoom < 0.0 {
            return None;
        }
        let base = zoom.floor() as usize;
        let lo = 1.0 / *self.resolutions.get(base)?;
        if zoom.fract() == 0.0 {
            return Some(lo);
        }
        let hi = 1.0 / *self.resolutions.get(base + 1)?;
        Some(lo + (hi - lo) * zoom.fract())
    }

    pub fn max_zoom(&self) -> usize {
        self.resolutions.len() - 1
    }

    pub fn latlng_to_pixel(&self, p: LatLng, zoom: f64) -> Option<[f64; 2]> {
        let scale = self.scale(zoom)?;
        let [x, y] = self.project(p);
        Some([
            scale * (x - self.origin[0]),
            scale * (-y + self.origin[1]),
        ])
    }

    pub fn pixel_to_latlng(&self, px: [f64; 2], zoom: f64) -> Option<LatLng> {
        let scale = self.scale(zoom)?;
        let x = px[0] / scale + self.origin[0];
        let y = -(px[1] / scale - self.origin[1]);
        Some(self.unproject([x, y]))
    }
}

/// The process-wide Baidu CRS. Built on first use; later calls return the
/// installed instance.
pub fn baidu() -> Result<&'static ProjectedCrs, CrsError> {
    BAIDU_CRS.get_or_try_init(|| {
        ProjectedCrs::from_proj_string(
            BAIDU_CRS_CODE,
            BAIDU_PROJ_DEF,
            baidu_resolutions().to_vec(),
            [0.0, 0.0],
            Aabb2::from_corners([BAIDU_MAX_EXTENT, 0.0], [0.0, BAIDU_MAX_EXTENT]),
        )
    })
}

/// CRS a map session renders in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapCrs {
    WebMercator,
    Baidu(&'static ProjectedCrs),
}

impl MapCrs {
    pub fn code(&self) -> &str {
        match self {
            MapCrs::WebMercator => "EPSG:3857",
            MapCrs::Baidu(crs) => &crs.code,
        }
    }

    pub fn is_baidu(&self) -> bool {
        matches!(self, MapCrs::Baidu(_))
    }

    pub fn latlng_to_pixel(&self, p: LatLng, zoom: f64) -> Option<[f64; 2]> {
        match self {
            MapCrs::WebMercator => {
                if !zoom.is_finite() {
                    return None;
                }
                let [x, y] = Mercator::web().project(p);
                let scale = TILE_SIZE * 2f64.powf(zoom);
                let k = 0.5 / (std::f64::consts::PI * Mercator::web().a);
                Some([scale * (k * x + 0.5), scale * (-k * y + 0.5)])
            }
            MapCrs::Baidu(crs) => crs.latlng_to_pixel(p, zoom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn ladder_shape() {
        let r = baidu_resolutions();
        assert_eq!(r.len(), 19);
        assert_eq!(r[0], 262_144.0);
        assert_eq!(r[18], 1.0);
        assert!(r.windows(2).all(|w| w[0] == 2.0 * w[1]));
    }

    #[test]
    fn ladder_is_memoized() {
        assert!(std::ptr::eq(baidu_resolutions(), baidu_resolutions()));
    }

    #[test]
    fn baidu_crs_is_installed_once() {
        let a = baidu().unwrap();
        let b = baidu().unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.code, BAIDU_CRS_CODE);
        assert_eq!(a.origin, [0.0, 0.0]);
        assert_eq!(a.bounds.max, [BAIDU_MAX_EXTENT, BAIDU_MAX_EXTENT]);
        assert_eq!(a.max_zoom(), 18);
    }

    #[test]
    fn scale_interpolates_between_zooms() {
        let crs = baidu().unwrap();
        assert_eq!(crs.scale(18.0), Some(1.0));
        assert_eq!(crs.scale(0.0), Some(1.0 / 262_144.0));
        assert_close(crs.scale(17.5).unwrap(), 0.75, 1e-12);
        assert!(crs.scale(19.0).is_none());
        assert!(crs.scale(-1.0).is_none());
    }

    #[test]
    fn pixel_round_trip() {
        let crs = baidu().unwrap();
        let p = LatLng::new(39.915, 116.404);
        let px = crs.latlng_to_pixel(p, 18.0).unwrap();
        assert!(px[0] > 0.0 && px[1] < 0.0);
        let back = crs.pixel_to_latlng(px, 18.0).unwrap();
        assert_close(back.lat, p.lat, 1e-9);
        assert_close(back.lng, p.lng, 1e-9);
    }

    #[test]
    fn unsupported_definition_is_loud() {
        let err = ProjectedCrs::from_proj_string(
            "EPSG:2154",
            "+proj=lcc +lat_1=49 +lat_2=44 +a=6378137",
            vec![1.0],
            [0.0, 0.0],
            Aabb2::from_corners([0.0, 0.0], [1.0, 1.0]),
        )
        .unwrap_err();
        assert_eq!(err, CrsError::UnsupportedProjection("lcc".to_string()));
        assert!(err.to_string().contains("lcc"));
    }

    #[test]
    fn web_mercator_origin_pixel() {
        let px = MapCrs::WebMercator
            .latlng_to_pixel(LatLng::new(0.0, 0.0), 0.0)
            .unwrap();
        assert_close(px[0], 128.0, 1e-9);
        assert_close(px[1], 128.0, 1e-9);
        assert_eq!(MapCrs::WebMercator.code(), "EPSG:3857");
    }
}
