use serde::{Deserialize, Serialize};

use foundation::bounds::Aabb2;

/// Half the EPSG:3857 world width in meters.
pub const WEB_MERCATOR_EXTENT: f64 = 20_037_508.342_789_244;
/// Deepest zoom any source will build a URL for.
pub const MAX_TILE_ZOOM: u8 = 30;

/// Tile address in the ZXY scheme.
///
/// `x`/`y` are signed: Baidu's grid is centered on the projection origin,
/// so tiles west/south of it carry negative indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: i64,
    pub y: i64,
}

impl TileCoord {
    pub fn new(z: u8, x: i64, y: i64) -> Self {
        Self { z, x, y }
    }

    /// Number of tile rows (and columns) at zoom `z`. Zooms past
    /// [`MAX_TILE_ZOOM`] are clamped to it.
    pub fn tiles_per_axis(z: u8) -> i64 {
        1i64 << z.min(MAX_TILE_ZOOM)
    }

    /// Row index counted from the bottom: `2^z - y - 1`.
    pub fn flipped_y(&self) -> i64 {
        Self::tiles_per_axis(self.z) - self.y - 1
    }

    pub fn flip_y(self) -> Self {
        Self {
            y: self.flipped_y(),
            ..self
        }
    }

    /// Tile extent in EPSG:3857 meters.
    pub fn bounds_3857(&self) -> Aabb2 {
        let size = 2.0 * WEB_MERCATOR_EXTENT / Self::tiles_per_axis(self.z) as f64;
        let min_x = -WEB_MERCATOR_EXTENT + self.x as f64 * size;
        let max_y = WEB_MERCATOR_EXTENT - self.y as f64 * size;
        Aabb2::from_corners([min_x, max_y - size], [min_x + size, max_y])
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
