//! Distance and area measurement with human-readable formatting.

use foundation::geo::LatLng;
use foundation::math::geodesy::{WGS84_A, haversine_m};

/// Labels appended to formatted measurements.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UnitLabels {
    /// `m`, `km`, `m²`, `ha`, `km²`.
    #[default]
    Symbols,
    /// 米, 公里, 平方米, 公顷, 平方公里.
    Chinese,
}

impl UnitLabels {
    fn meters(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "m",
            UnitLabels::Chinese => "米",
        }
    }

    fn kilometers(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "km",
            UnitLabels::Chinese => "公里",
        }
    }

    fn square_meters(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "m²",
            UnitLabels::Chinese => "平方米",
        }
    }

    fn hectares(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "ha",
            UnitLabels::Chinese => "公顷",
        }
    }

    fn square_kilometers(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "km²",
            UnitLabels::Chinese => "平方公里",
        }
    }

    /// Prefix for the live distance tooltip.
    pub fn distance_caption(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "Distance",
            UnitLabels::Chinese => "距离",
        }
    }

    /// Prefix for the live area tooltip.
    pub fn area_caption(self) -> &'static str {
        match self {
            UnitLabels::Symbols => "Area",
            UnitLabels::Chinese => "面积",
        }
    }
}

/// Sum of great-circle segment lengths in meters.
pub fn total_distance_m(points: &[LatLng]) -> f64 {
    points.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Spherical polygon area in square meters. The ring is implicitly closed.
pub fn polygon_area_m2(points: &[LatLng]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut acc = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let lat1 = a.lat.to_radians();
        let lat2 = b.lat.to_radians();
        acc += (b.lng.to_radians() - a.lng.to_radians()) * (2.0 + lat1.sin() + lat2.sin());
    }
    acc.abs() * WGS84_A * WGS84_A / 2.0
}

pub fn format_distance(meters: f64, labels: UnitLabels) -> String {
    if meters >= 1000.0 {
        format!("{:.2} {}", meters / 1000.0, labels.kilometers())
    } else {
        format!("{:.2} {}", meters, labels.meters())
    }
}

pub fn format_area(square_meters: f64, labels: UnitLabels) -> String {
    if square_meters >= 1_000_000.0 {
        format!("{:.2} {}", square_meters / 1_000_000.0, labels.square_kilometers())
    } else if square_meters >= 10_000.0 {
        format!("{:.2} {}", square_meters / 10_000.0, labels.hectares())
    } else {
        format!("{:.2} {}", square_meters, labels.square_meters())
    }
}

/// Formatted total length; fewer than two points yields `0 <meters>`.
pub fn distance_label(points: &[LatLng], labels: UnitLabels) -> String {
    if points.len() < 2 {
        return format!("0 {}", labels.meters());
    }
    format_distance(total_distance_m(points), labels)
}

/// Formatted area; fewer than three points yields `0 <square meters>`.
pub fn area_label(points: &[LatLng], labels: UnitLabels) -> String {
    if points.len() < 3 {
        return format!("0 {}", labels.square_meters());
    }
    format_area(polygon_area_m2(points), labels)
}

pub fn circle_area_hectares(radius_m: f64) -> f64 {
    std::f64::consts::PI * radius_m * radius_m / 10_000.0
}

pub fn circle_area_label(radius_m: f64, labels: UnitLabels) -> String {
    format!("{:.2} {}", circle_area_hectares(radius_m), labels.hectares())
}

/// Vertex at index `len / 2`; `(0, 0)` for an empty line.
pub fn line_midpoint(points: &[LatLng]) -> LatLng {
    match points.len() {
        0 => LatLng::new(0.0, 0.0),
        n => points[n / 2],
    }
}

/// Arithmetic mean of the vertices; `(0, 0)` for an empty ring.
pub fn vertex_centroid(points: &[LatLng]) -> LatLng {
    if points.is_empty() {
        return LatLng::new(0.0, 0.0);
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    LatLng::new(lat / n, lng / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn kilometer_at_equator_formats_in_km() {
        let pts = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.009)];
        assert_close(total_distance_m(&pts), 1000.75, 0.01);
        assert_eq!(distance_label(&pts, UnitLabels::Symbols), "1.00 km");
        assert_eq!(distance_label(&pts, UnitLabels::Chinese), "1.00 公里");
    }

    #[test]
    fn just_under_a_kilometer_stays_in_meters() {
        let pts = [LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.008983)];
        assert_eq!(distance_label(&pts, UnitLabels::Symbols), "998.86 m");
    }

    #[test]
    fn degenerate_inputs_give_zero() {
        let one = [LatLng::new(1.0, 1.0)];
        assert_eq!(distance_label(&one, UnitLabels::Chinese), "0 米");
        assert_eq!(area_label(&one, UnitLabels::Symbols), "0 m²");
        assert_eq!(polygon_area_m2(&[]), 0.0);
        assert_eq!(total_distance_m(&[]), 0.0);
    }

    #[test]
    fn area_unit_thresholds() {
        assert_eq!(format_area(9_999.0, UnitLabels::Symbols), "9999.00 m²");
        assert_eq!(format_area(10_000.0, UnitLabels::Symbols), "1.00 ha");
        assert_eq!(format_area(999_999.0, UnitLabels::Chinese), "100.00 公顷");
        assert_eq!(format_area(2_500_000.0, UnitLabels::Chinese), "2.50 平方公里");
    }

    #[test]
    fn one_degree_square_at_equator() {
        let square = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 1.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(1.0, 0.0),
        ];
        let d = 1f64.to_radians();
        let expected = d * d.sin() * WGS84_A * WGS84_A;
        assert_close(polygon_area_m2(&square), expected, expected * 1e-9);
        assert!(area_label(&square, UnitLabels::Symbols).ends_with(" km²"));
    }

    #[test]
    fn area_ignores_winding() {
        let ccw = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.01),
            LatLng::new(0.01, 0.01),
        ];
        let cw = [ccw[2], ccw[1], ccw[0]];
        let a = polygon_area_m2(&ccw);
        assert!(a > 0.0);
        assert_close(polygon_area_m2(&cw), a, a * 1e-9);
    }

    #[test]
    fn circle_area() {
        assert_close(circle_area_hectares(100.0), 3.14159, 1e-5);
        assert_eq!(circle_area_label(100.0, UnitLabels::Chinese), "3.14 公顷");
    }

    #[test]
    fn label_anchors() {
        let pts = [
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 2.0),
            LatLng::new(2.0, 4.0),
            LatLng::new(3.0, 6.0),
        ];
        assert_eq!(line_midpoint(&pts), LatLng::new(2.0, 4.0));
        assert_eq!(line_midpoint(&pts[..1]), LatLng::new(0.0, 0.0));
        assert_eq!(vertex_centroid(&pts), LatLng::new(1.5, 3.0));
        assert_eq!(vertex_centroid(&[]), LatLng::new(0.0, 0.0));
    }
}
