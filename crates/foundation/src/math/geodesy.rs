use crate::geo::LatLng;

/// WGS84 semi-major axis (meters). Also the sphere radius used for
/// Web Mercator and for spherical polygon area.
pub const WGS84_A: f64 = 6_378_137.0;
/// Mean earth radius used for great-circle distance (meters).
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters on a sphere of radius
/// [`EARTH_MEAN_RADIUS_M`].
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let rad = std::f64::consts::PI / 180.0;
    let lat1 = a.lat * rad;
    let lat2 = b.lat * rad;
    let sin_dlat = ((b.lat - a.lat) * rad / 2.0).sin();
    let sin_dlng = ((b.lng - a.lng) * rad / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_MEAN_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::haversine_m;
    use crate::geo::LatLng;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = LatLng::new(39.9, 116.4);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = haversine_m(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert_close(d, 111_194.93, 0.01);
    }

    #[test]
    fn symmetric() {
        let a = LatLng::new(31.23, 121.47);
        let b = LatLng::new(39.9, 116.4);
        assert_close(haversine_m(a, b), haversine_m(b, a), 1e-6);
    }
}
