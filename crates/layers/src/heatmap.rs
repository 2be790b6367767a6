use serde::{Deserialize, Serialize};

use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapOptions {
    pub radius: f64,
    pub blur: f64,
    pub max_zoom: u8,
    pub max: f64,
    pub min_opacity: f64,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            radius: 25.0,
            blur: 15.0,
            max_zoom: 17,
            max: 1.0,
            min_opacity: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub at: LatLng,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeatmapError {
    /// A row that is not `[lat, lng]` or `[lat, lng, intensity]`.
    InvalidPoint { index: usize, len: usize },
}

impl std::fmt::Display for HeatmapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeatmapError::InvalidPoint { index, len } => write!(
                f,
                "heatmap point {index} has {len} values, expected [lat, lng] or [lat, lng, intensity]"
            ),
        }
    }
}

impl std::error::Error for HeatmapError {}

impl HeatPoint {
    pub fn parse_rows(rows: &[Vec<f64>]) -> Result<Vec<HeatPoint>, HeatmapError> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| match row.as_slice() {
                [lat, lng] => Ok(HeatPoint {
                    at: LatLng::new(*lat, *lng),
                    intensity: 1.0,
                }),
                [lat, lng, intensity] => Ok(HeatPoint {
                    at: LatLng::new(*lat, *lng),
                    intensity: *intensity,
                }),
                _ => Err(HeatmapError::InvalidPoint {
                    index,
                    len: row.len(),
                }),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub options: HeatmapOptions,
    pub points: Vec<HeatPoint>,
}

impl Heatmap {
    pub fn new(points: Vec<HeatPoint>, options: HeatmapOptions) -> Self {
        Self { options, points }
    }

    pub fn total_intensity(&self) -> f64 {
        self.points.iter().map(|p| p.intensity).sum()
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        let coords: Vec<LatLng> = self.points.iter().map(|p| p.at).collect();
        LatLngBounds::from_points(&coords)
    }
}
