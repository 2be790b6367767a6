use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;
use foundation::math::crs::MapCrs;

pub struct SpatialAnalysis;

impl SpatialAnalysis {
    /// Union of the given extents.
    pub fn union_bounds(extents: impl IntoIterator<Item = LatLngBounds>) -> Option<LatLngBounds> {
        extents.into_iter().reduce(LatLngBounds::union)
    }

    pub fn bounds_of(points: &[LatLng]) -> Option<LatLngBounds> {
        LatLngBounds::from_points(points)
    }

    /// Highest integer zoom in `min_zoom..=max_zoom` at which `bounds` fits
    /// inside the viewport shrunk by `padding_px` on every side.
    ///
    /// A zero-size extent fits at any zoom and yields `max_zoom`.
    pub fn fit_zoom(
        crs: &MapCrs,
        bounds: &LatLngBounds,
        viewport_px: [f64; 2],
        padding_px: f64,
        min_zoom: u8,
        max_zoom: u8,
    ) -> u8 {
        let avail = [
            (viewport_px[0] - 2.0 * padding_px).max(0.0),
            (viewport_px[1] - 2.0 * padding_px).max(0.0),
        ];
        for z in (min_zoom..=max_zoom).rev() {
            let zoom = z as f64;
            let (Some(sw), Some(ne)) = (
                crs.latlng_to_pixel(bounds.south_west, zoom),
                crs.latlng_to_pixel(bounds.north_east, zoom),
            ) else {
                continue;
            };
            let w = (ne[0] - sw[0]).abs();
            let h = (ne[1] - sw[1]).abs();
            if w <= avail[0] && h <= avail[1] {
                return z;
            }
        }
        min_zoom
    }
}
