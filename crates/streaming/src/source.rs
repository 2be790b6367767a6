use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::template::{TemplateError, interpolate};
use crate::tile::{MAX_TILE_ZOOM, TileCoord};

pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 18;

/// A templated raster tile endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSource {
    pub url_template: String,
    #[serde(default)]
    pub subdomains: Vec<String>,
    /// Count rows from the bottom (`y' = 2^z - y - 1`).
    #[serde(default)]
    pub tms: bool,
    #[serde(default)]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default)]
    pub attribution: String,
    #[serde(default)]
    pub retina: bool,
    /// Extra template values, e.g. `{style}`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_max_zoom() -> u8 {
    DEFAULT_MAX_ZOOM
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileUrlError {
    Template(TemplateError),
    ZoomOutOfRange { z: u8, min: u8, max: u8 },
}

impl std::fmt::Display for TileUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TileUrlError::Template(e) => write!(f, "{e}"),
            TileUrlError::ZoomOutOfRange { z, min, max } => {
                write!(f, "zoom {z} outside {min}..={max}")
            }
        }
    }
}

impl std::error::Error for TileUrlError {}

impl From<TemplateError> for TileUrlError {
    fn from(value: TemplateError) -> Self {
        TileUrlError::Template(value)
    }
}

/// Splits a subdomain spec the way tile libraries accept it: a plain string
/// is one subdomain per character.
pub fn split_subdomains(spec: &str) -> Vec<String> {
    spec.chars().map(|c| c.to_string()).collect()
}

impl TileSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            subdomains: Vec::new(),
            tms: false,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            attribution: String::new(),
            retina: false,
            options: BTreeMap::new(),
        }
    }

    pub fn with_subdomains(mut self, spec: &str) -> Self {
        self.subdomains = split_subdomains(spec);
        self
    }

    pub fn with_tms(mut self, tms: bool) -> Self {
        self.tms = tms;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }

    /// Subdomain for a tile, rotating on `|x + y|` of the unflipped address.
    pub fn subdomain(&self, coord: TileCoord) -> Option<&str> {
        if self.subdomains.is_empty() {
            return None;
        }
        let idx = (coord.x + coord.y).unsigned_abs() as usize % self.subdomains.len();
        Some(self.subdomains[idx].as_str())
    }

    /// Fails for zooms outside the configured range or past [`MAX_TILE_ZOOM`].
    pub fn tile_url(&self, coord: TileCoord) -> Result<String, TileUrlError> {
        let max = self.max_zoom.min(MAX_TILE_ZOOM);
        if coord.z < self.min_zoom || coord.z > max {
            return Err(TileUrlError::ZoomOutOfRange {
                z: coord.z,
                min: self.min_zoom,
                max,
            });
        }

        let mut values = self.options.clone();
        if let Some(s) = self.subdomain(coord) {
            values.insert("s".to_string(), s.to_string());
        }
        let y = if self.tms { coord.flipped_y() } else { coord.y };
        values.insert("x".to_string(), coord.x.to_string());
        values.insert("y".to_string(), y.to_string());
        values.insert("-y".to_string(), coord.flipped_y().to_string());
        values.insert("z".to_string(), coord.z.to_string());
        values.insert(
            "r".to_string(),
            if self.retina { "@2x" } else { "" }.to_string(),
        );
        Ok(interpolate(&self.url_template, &values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{TileSource, TileUrlError};
    use crate::template::TemplateError;
    use crate::tile::TileCoord;

    #[test]
    fn xyz_url_with_subdomain_rotation() {
        let src = TileSource::new("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
            .with_subdomains("abc");
        assert_eq!(
            src.tile_url(TileCoord::new(3, 1, 2)).unwrap(),
            "https://a.tile.openstreetmap.org/3/1/2.png"
        );
        assert_eq!(
            src.tile_url(TileCoord::new(3, 1, 3)).unwrap(),
            "https://b.tile.openstreetmap.org/3/1/3.png"
        );
    }

    #[test]
    fn negative_indices_rotate_on_absolute_sum() {
        let src = TileSource::new("{s}").with_subdomains("0123456789");
        assert_eq!(src.subdomain(TileCoord::new(5, -7, 2)), Some("5"));
    }

    #[test]
    fn tms_flips_y() {
        let src = TileSource::new("{z}/{x}/{y}").with_tms(true);
        assert_eq!(src.tile_url(TileCoord::new(3, 0, 0)).unwrap(), "3/0/7");
        assert_eq!(src.tile_url(TileCoord::new(3, 0, 7)).unwrap(), "3/0/0");
        assert_eq!(src.tile_url(TileCoord::new(0, 0, 0)).unwrap(), "0/0/0");
    }

    #[test]
    fn retina_suffix() {
        let mut src = TileSource::new("{z}/{x}/{y}{r}.png");
        src.retina = true;
        assert_eq!(src.tile_url(TileCoord::new(1, 0, 0)).unwrap(), "1/0/0@2x.png");
    }

    #[test]
    fn subdomain_placeholder_without_subdomains_fails() {
        let src = TileSource::new("https://{s}.example/{z}");
        assert_eq!(
            src.tile_url(TileCoord::new(1, 0, 0)).unwrap_err(),
            TileUrlError::Template(TemplateError::UnknownPlaceholder("s".to_string()))
        );
    }

    #[test]
    fn zoom_outside_range_fails() {
        let src = TileSource::new("{z}").with_zoom_range(3, 19);
        assert!(matches!(
            src.tile_url(TileCoord::new(2, 0, 0)),
            Err(TileUrlError::ZoomOutOfRange { z: 2, .. })
        ));
    }

    #[test]
    fn zoom_past_hard_cap_fails_even_when_configured() {
        let src = TileSource::new("{z}/{x}/{-y}").with_zoom_range(0, u8::MAX);
        assert_eq!(
            src.tile_url(TileCoord::new(63, 0, 0)).unwrap_err(),
            TileUrlError::ZoomOutOfRange {
                z: 63,
                min: 0,
                max: 30
            }
        );
        assert!(src.tile_url(TileCoord::new(30, 0, 0)).is_ok());
    }

    #[test]
    fn extra_options_fill_placeholders() {
        let mut src = TileSource::new("{z}/{x}/{y}?style={style}");
        src.options.insert("style".to_string(), "6".to_string());
        assert_eq!(src.tile_url(TileCoord::new(2, 1, 1)).unwrap(), "2/1/1?style=6");
    }
}
